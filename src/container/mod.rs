mod instantiate;

pub use instantiate::{InstantiateOptions, InstantiatedEntries};

use std::sync::Arc;

use crate::animation::AnimationGroupId;
use crate::material::Material;
use crate::scene_graph::node::NodeId;
use crate::scene_graph::scene::Scene;
use crate::skeleton::SkeletonId;
use crate::texture::Texture;

/// Buffers a subset of a scene's entities so they can be attached, detached,
/// instantiated, or disposed independently of the live scene. The container
/// holds handles only; storage stays with the scene.
#[derive(Default)]
pub struct AssetContainer {
    /// Transform nodes (no mesh payload).
    pub nodes: Vec<NodeId>,
    /// Nodes carrying a mesh payload.
    pub meshes: Vec<NodeId>,
    pub skeletons: Vec<SkeletonId>,
    pub animation_groups: Vec<AnimationGroupId>,
    pub materials: Vec<Arc<Material>>,
    pub textures: Vec<Arc<Texture>>,
}

impl AssetContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, scene: &Scene, id: NodeId) {
        match scene.get_node(id) {
            Some(node) if node.is_mesh() => self.meshes.push(id),
            Some(_) => self.nodes.push(id),
            None => {}
        }
    }

    /// Marks every contained entity as part of the scene again.
    pub fn add_all_to_scene(&self, scene: &mut Scene) {
        self.set_attached(scene, true);
    }

    /// Detaches every contained entity from the scene. The entities survive
    /// and stay instantiable; only scene membership changes.
    pub fn remove_all_from_scene(&self, scene: &mut Scene) {
        self.set_attached(scene, false);
    }

    fn set_attached(&self, scene: &mut Scene, attached: bool) {
        for &id in self.nodes.iter().chain(&self.meshes) {
            if let Some(node) = scene.get_node_mut(id) {
                node.attached = attached;
            }
        }
        for &id in &self.skeletons {
            if let Some(skeleton) = scene.get_skeleton_mut(id) {
                skeleton.attached = attached;
            }
        }
        for &id in &self.animation_groups {
            if let Some(group) = scene.get_animation_group_mut(id) {
                group.attached = attached;
            }
        }
    }

    /// Captures every attached entity of the scene into this container, then
    /// detaches them all.
    pub fn move_all_from_scene(&mut self, scene: &mut Scene) {
        let node_ids: Vec<NodeId> = scene.nodes().map(|(id, _)| id).collect();
        for id in node_ids {
            self.add_node(scene, id);
        }
        self.skeletons.extend(scene.skeletons().map(|(id, _)| id));
        self.animation_groups
            .extend(scene.animation_groups().map(|(id, _)| id));

        self.remove_all_from_scene(scene);
    }

    /// Tombstones every contained entity and empties the buckets.
    pub fn dispose(&mut self, scene: &mut Scene) {
        for &id in self.nodes.iter().chain(&self.meshes) {
            scene.dispose_node(id);
        }
        for &id in &self.skeletons {
            if let Some(skeleton) = scene.get_skeleton_mut(id) {
                skeleton.disposed = true;
                skeleton.attached = false;
            }
        }
        for &id in &self.animation_groups {
            if let Some(group) = scene.get_animation_group_mut(id) {
                group.disposed = true;
                group.attached = false;
            }
        }

        self.nodes.clear();
        self.meshes.clear();
        self.skeletons.clear();
        self.animation_groups.clear();
        self.materials.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationGroup;
    use crate::scene_graph::node::SceneNode;
    use crate::skeleton::Skeleton;

    fn scene_with_entities() -> (Scene, AssetContainer) {
        let mut scene = Scene::new();
        let mut container = AssetContainer::new();

        let node = scene.add_node(SceneNode {
            name: "node".to_string(),
            ..Default::default()
        });
        container.add_node(&scene, node);

        let skeleton = scene.add_skeleton(Skeleton::new("skeleton"));
        container.skeletons.push(skeleton);

        let group = scene.add_animation_group(AnimationGroup::new("group"));
        container.animation_groups.push(group);

        (scene, container)
    }

    #[test]
    fn remove_then_add_round_trips_attachment() {
        let (mut scene, container) = scene_with_entities();

        container.remove_all_from_scene(&mut scene);
        assert_eq!(scene.nodes().count(), 0);
        assert_eq!(scene.skeletons().count(), 0);
        assert_eq!(scene.animation_groups().count(), 0);

        container.add_all_to_scene(&mut scene);
        assert_eq!(scene.nodes().count(), 1);
        assert_eq!(scene.skeletons().count(), 1);
        assert_eq!(scene.animation_groups().count(), 1);
    }

    #[test]
    fn move_all_from_scene_captures_and_detaches() {
        let (mut scene, _) = scene_with_entities();

        let mut captured = AssetContainer::new();
        captured.move_all_from_scene(&mut scene);

        assert_eq!(captured.nodes.len(), 1);
        assert_eq!(captured.skeletons.len(), 1);
        assert_eq!(captured.animation_groups.len(), 1);
        assert_eq!(scene.nodes().count(), 0);
        assert_eq!(scene.skeletons().count(), 0);
    }

    #[test]
    fn dispose_tombstones_and_clears() {
        let (mut scene, mut container) = scene_with_entities();
        let node = container.nodes[0];
        let skeleton = container.skeletons[0];

        container.dispose(&mut scene);

        assert!(container.nodes.is_empty());
        assert!(container.skeletons.is_empty());
        assert!(scene.get_node(node).is_none());
        assert!(scene.get_skeleton(skeleton).is_none());
    }
}
