use glam::Mat4;
use id_arena::Arena;

use crate::animation::{AnimationGroup, AnimationGroupId, AnimationTarget};
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::skeleton::{Skeleton, SkeletonId};

/// Owns every entity of one scene. Arena slots are never freed; disposal
/// tombstones the entity so unique identifiers stay valid for the scene's
/// lifetime.
pub struct Scene {
    pub nodes: Arena<SceneNode>,
    pub skeletons: Arena<Skeleton>,
    pub animation_groups: Arena<AnimationGroup>,
    next_unique_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            skeletons: Arena::new(),
            animation_groups: Arena::new(),
            next_unique_id: 1,
        }
    }

    /// Hands out the next process-unique identifier. Nodes, skeletons,
    /// animation groups and morph targets all draw from this one counter.
    pub fn take_unique_id(&mut self) -> u64 {
        let id = self.next_unique_id;
        self.next_unique_id += 1;
        id
    }

    pub fn add_node(&mut self, mut node: SceneNode) -> NodeId {
        node.unique_id = self.take_unique_id();
        self.nodes.alloc(node)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id).filter(|node| !node.disposed)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id).filter(|node| !node.disposed)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| !node.disposed && node.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_skeleton(&mut self, mut skeleton: Skeleton) -> SkeletonId {
        skeleton.unique_id = self.take_unique_id();
        self.skeletons.alloc(skeleton)
    }

    pub fn get_skeleton(&self, id: SkeletonId) -> Option<&Skeleton> {
        self.skeletons.get(id).filter(|skeleton| !skeleton.disposed)
    }

    pub fn get_skeleton_mut(&mut self, id: SkeletonId) -> Option<&mut Skeleton> {
        self.skeletons
            .get_mut(id)
            .filter(|skeleton| !skeleton.disposed)
    }

    pub fn add_animation_group(&mut self, mut group: AnimationGroup) -> AnimationGroupId {
        group.unique_id = self.take_unique_id();
        self.animation_groups.alloc(group)
    }

    pub fn get_animation_group(&self, id: AnimationGroupId) -> Option<&AnimationGroup> {
        self.animation_groups.get(id).filter(|group| !group.disposed)
    }

    pub fn get_animation_group_mut(&mut self, id: AnimationGroupId) -> Option<&mut AnimationGroup> {
        self.animation_groups
            .get_mut(id)
            .filter(|group| !group.disposed)
    }

    /// Live, attached nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.attached && !node.disposed)
    }

    pub fn skeletons(&self) -> impl Iterator<Item = (SkeletonId, &Skeleton)> {
        self.skeletons
            .iter()
            .filter(|(_, skeleton)| skeleton.attached && !skeleton.disposed)
    }

    pub fn animation_groups(&self) -> impl Iterator<Item = (AnimationGroupId, &AnimationGroup)> {
        self.animation_groups
            .iter()
            .filter(|(_, group)| group.attached && !group.disposed)
    }

    /// Resolves an animation target to the unique identifier of the entity it
    /// drives, if that entity is still alive.
    pub fn target_unique_id(&self, target: AnimationTarget) -> Option<u64> {
        match target {
            AnimationTarget::Node(id) => self.get_node(id).map(|node| node.unique_id),
            AnimationTarget::MorphTarget { node, index } => self
                .get_node(node)
                .and_then(|node| node.mesh.as_ref())
                .and_then(|mesh| mesh.morph_targets.as_ref())
                .and_then(|manager| manager.targets.get(index))
                .map(|target| target.unique_id),
        }
    }

    /// Sets the parent of a node and updates child relationships.
    pub fn set_node_parent(&mut self, child_id: NodeId, new_parent_id: Option<NodeId>) {
        // Remove from old parent's children list
        if let Some(child) = self.nodes.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.nodes.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        // Set new parent and add to new parent's children list
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.nodes.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_node_hierarchy(child_id);
    }

    /// Invalidates world transforms for a node and all its descendants.
    pub fn invalidate_node_hierarchy(&self, node_id: NodeId) {
        if let Some(node) = self.nodes.get(node_id) {
            node.transform.invalidate_world();

            for &child_id in &node.child_ids {
                self.invalidate_node_hierarchy(child_id);
            }
        }
    }

    /// Updates all node world transforms in hierarchical order.
    pub fn update_transforms(&self) {
        let root_nodes = self.nodes.iter().filter_map(|(id, node)| {
            if node.parent_id.is_none() && !node.disposed {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_nodes {
            self.update_node_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_node_transform_recursive(
        &self,
        node_id: NodeId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        if let Some(node) = self.nodes.get(node_id) {
            // A clean child still needs a recompute when an ancestor's world
            // matrix changed this pass.
            let needs_update = parent_changed || node.transform.is_world_dirty();
            if needs_update {
                let local_matrix = *node.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                node.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *node.transform.get_world_matrix();
            for &child_id in &node.child_ids {
                self.update_node_transform_recursive(child_id, world_matrix, needs_update);
            }
        }
    }

    /// Tombstones a node and its descendants. The slot and unique identifier
    /// are never reused; lookups treat the node as gone.
    pub fn dispose_node(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.get(node_id) else {
            return;
        };
        if node.disposed {
            return;
        }

        let parent_id = node.parent_id;
        let child_ids = node.child_ids.clone();

        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.child_ids.retain(|&id| id != node_id);
            }
        }

        if let Some(node) = self.nodes.get_mut(node_id) {
            node.disposed = true;
            node.attached = false;
            node.parent_id = None;
            node.child_ids.clear();
            node.mesh = None;
        }

        for child_id in child_ids {
            self.dispose_node(child_id);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn named(name: &str) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn unique_ids_are_monotonic_and_never_reused() {
        let mut scene = Scene::new();
        let a = scene.add_node(named("a"));
        let first_id = scene.get_node(a).unwrap().unique_id;

        scene.dispose_node(a);
        assert!(scene.get_node(a).is_none());

        let b = scene.add_node(named("b"));
        assert!(scene.get_node(b).unwrap().unique_id > first_id);
    }

    #[test]
    fn reparenting_rewires_child_lists() {
        let mut scene = Scene::new();
        let parent_a = scene.add_node(named("a"));
        let parent_b = scene.add_node(named("b"));
        let child = scene.add_node(named("child"));

        scene.set_node_parent(child, Some(parent_a));
        assert_eq!(scene.get_node(parent_a).unwrap().child_ids, vec![child]);

        scene.set_node_parent(child, Some(parent_b));
        assert!(scene.get_node(parent_a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_node(parent_b).unwrap().child_ids, vec![child]);
        assert_eq!(scene.get_node(child).unwrap().parent_id, Some(parent_b));
    }

    #[test]
    fn world_transforms_compose_down_the_hierarchy() {
        let mut scene = Scene::new();
        let mut root = named("root");
        root.transform.set_translation(Vec3::new(1.0, 0.0, 0.0));
        let root = scene.add_node(root);

        let mut child = named("child");
        child.transform.set_translation(Vec3::new(0.0, 2.0, 0.0));
        let child = scene.add_node(child);
        scene.set_node_parent(child, Some(root));

        scene.update_transforms();

        let world = *scene.get_node(child).unwrap().transform.get_world_matrix();
        let position = world.transform_point3(Vec3::ZERO);
        assert_eq!(position, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn moving_a_parent_propagates_to_clean_descendants() {
        let mut scene = Scene::new();
        let root = scene.add_node(named("root"));
        let child = scene.add_node(named("child"));
        scene.set_node_parent(child, Some(root));

        scene.update_transforms();

        scene
            .get_node_mut(root)
            .unwrap()
            .transform
            .set_translation(Vec3::new(5.0, 0.0, 0.0));
        scene.update_transforms();

        let world = *scene.get_node(child).unwrap().transform.get_world_matrix();
        let position = world.transform_point3(Vec3::ZERO);
        assert_eq!(position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn dispose_recurses_and_unlinks() {
        let mut scene = Scene::new();
        let root = scene.add_node(named("root"));
        let child = scene.add_node(named("child"));
        scene.set_node_parent(child, Some(root));

        scene.dispose_node(root);
        assert!(scene.get_node(root).is_none());
        assert!(scene.get_node(child).is_none());
        assert_eq!(scene.nodes().count(), 0);
    }
}
