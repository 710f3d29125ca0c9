//! Hierarchy instantiation: clone a container's captured entities into the
//! scene, rewriting every internal cross-reference to the corresponding clone.

use std::collections::{HashMap, HashSet};

use crate::animation::{AnimationGroup, AnimationGroupId, AnimationTarget, TargetedAnimation};
use crate::container::AssetContainer;
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::scene_graph::scene::Scene;
use crate::skeleton::SkeletonId;

#[derive(Default)]
pub struct InstantiateOptions<'a> {
    /// Applied to every cloned node's name; identity when absent.
    pub name_function: Option<&'a dyn Fn(&str) -> String>,
}

impl InstantiateOptions<'_> {
    fn apply_name(&self, name: &str) -> String {
        match self.name_function {
            Some(function) => function(name),
            None => name.to_string(),
        }
    }
}

/// The cloned entities, owned by the caller once returned.
#[derive(Default)]
pub struct InstantiatedEntries {
    /// Clones of the container's parentless nodes and meshes.
    pub root_nodes: Vec<NodeId>,
    pub skeletons: Vec<SkeletonId>,
    pub animation_groups: Vec<AnimationGroupId>,
}

#[derive(Clone, Copy)]
enum EntityHandle {
    Node(NodeId),
    MorphTarget { node: NodeId, index: usize },
}

/// Pass-local bookkeeping: the translation table (original unique id to clone
/// unique id, write-once) and the clone store (clone unique id to handle).
/// Both are discarded when the pass returns.
#[derive(Default)]
struct CloneTables {
    conversion: HashMap<u64, u64>,
    clones: HashMap<u64, EntityHandle>,
}

impl CloneTables {
    fn record(&mut self, original: u64, clone: u64, handle: EntityHandle) {
        self.conversion.entry(original).or_insert(clone);
        self.clones.insert(clone, handle);
    }

    fn resolve(&self, original: u64) -> Option<EntityHandle> {
        self.conversion
            .get(&original)
            .and_then(|clone| self.clones.get(clone))
            .copied()
    }

    fn resolve_node(&self, original: u64) -> Option<NodeId> {
        match self.resolve(original)? {
            EntityHandle::Node(id) => Some(id),
            EntityHandle::MorphTarget { .. } => None,
        }
    }

    fn resolve_target(&self, original: u64) -> Option<AnimationTarget> {
        Some(match self.resolve(original)? {
            EntityHandle::Node(id) => AnimationTarget::Node(id),
            EntityHandle::MorphTarget { node, index } => {
                AnimationTarget::MorphTarget { node, index }
            }
        })
    }
}

impl AssetContainer {
    /// Clones every captured hierarchy into the scene, sharing geometry and
    /// materials, then clones skeletons and animation groups with their
    /// references rewritten through the pass-local tables.
    ///
    /// References pointing outside the captured set keep their original
    /// target; the pass never fails on a missing lookup.
    pub fn instantiate_models_to_scene(
        &self,
        scene: &mut Scene,
        options: &InstantiateOptions,
    ) -> InstantiatedEntries {
        let mut tables = CloneTables::default();
        let mut entries = InstantiatedEntries::default();

        // Nodes and meshes first; skeleton and animation remapping below
        // requires the tables to be fully populated.
        for &node_id in self.nodes.iter().chain(&self.meshes) {
            let is_root = scene
                .get_node(node_id)
                .map(|node| node.parent_id.is_none())
                .unwrap_or(false);
            if !is_root {
                // Parented entities are cloned as part of their root's
                // hierarchy, not independently.
                continue;
            }

            if let Some(clone_id) = clone_hierarchy(scene, node_id, None, options, &mut tables) {
                entries.root_nodes.push(clone_id);
            }
        }

        let mut rewritten_skeletons: HashSet<u64> = HashSet::new();

        for &skeleton_id in &self.skeletons {
            let (mut clone, original_override_uid) = {
                let Some(original) = scene.get_skeleton(skeleton_id) else {
                    continue;
                };
                let clone = original.clone_with_name(format!("Clone of {}", original.name));
                let override_uid = original
                    .override_mesh
                    .and_then(|mesh_id| scene.get_node(mesh_id))
                    .map(|mesh| mesh.unique_id);
                (clone, override_uid)
            };

            clone.override_mesh = original_override_uid.and_then(|uid| {
                let resolved = tables.resolve_node(uid);
                if resolved.is_none() {
                    log::warn!(
                        "Override mesh of skeleton '{}' is outside the instantiated set; leaving it unset",
                        clone.name
                    );
                }
                resolved
            });

            let clone_id = scene.add_skeleton(clone);
            let clone_uid = scene
                .get_skeleton(clone_id)
                .map(|skeleton| skeleton.unique_id)
                .unwrap_or(0);
            entries.skeletons.push(clone_id);

            for &mesh_id in &self.meshes {
                let Some(mesh_node) = scene.get_node(mesh_id) else {
                    continue;
                };
                let Some(mesh) = mesh_node.mesh.as_ref() else {
                    continue;
                };
                if mesh.is_instance() || mesh.skeleton != Some(skeleton_id) {
                    continue;
                }
                let mesh_uid = mesh_node.unique_id;

                let Some(clone_mesh_id) = tables.resolve_node(mesh_uid) else {
                    continue;
                };
                if let Some(clone_mesh) = scene
                    .get_node_mut(clone_mesh_id)
                    .and_then(|node| node.mesh.as_mut())
                {
                    clone_mesh.skeleton = Some(clone_id);
                }

                // Bone links are rewritten at most once per cloned skeleton,
                // no matter how many meshes bind to it.
                if rewritten_skeletons.insert(clone_uid) {
                    rewrite_bone_links(scene, clone_id, &tables);
                }
            }
        }

        for &group_id in &self.animation_groups {
            let (name, targeted_animations) = {
                let Some(original) = scene.get_animation_group(group_id) else {
                    continue;
                };
                (original.name.clone(), original.targeted_animations.clone())
            };

            let targeted_animations: Vec<TargetedAnimation> = targeted_animations
                .into_iter()
                .map(|targeted| {
                    // A target outside the cloned set keeps driving the
                    // original entity.
                    let target = scene
                        .target_unique_id(targeted.target)
                        .and_then(|uid| tables.resolve_target(uid))
                        .unwrap_or(targeted.target);
                    TargetedAnimation {
                        animation: targeted.animation,
                        target,
                    }
                })
                .collect();

            let mut clone = AnimationGroup::new(name);
            clone.targeted_animations = targeted_animations;
            let clone_id = scene.add_animation_group(clone);
            entries.animation_groups.push(clone_id);
        }

        entries
    }
}

/// Recursively clones a node and its descendants, sharing the mesh payload's
/// geometry and material. Every (original, clone) pair, morph targets
/// included, is recorded in the tables.
fn clone_hierarchy(
    scene: &mut Scene,
    original_id: NodeId,
    parent: Option<NodeId>,
    options: &InstantiateOptions,
    tables: &mut CloneTables,
) -> Option<NodeId> {
    let (original_uid, name, transform, mesh, child_ids) = {
        let original = scene.get_node(original_id)?;
        (
            original.unique_id,
            options.apply_name(&original.name),
            original.transform.clone(),
            original.mesh.clone(),
            original.child_ids.clone(),
        )
    };

    let clone_id = scene.add_node(SceneNode {
        name,
        unique_id: 0,
        transform,
        mesh,
        parent_id: None,
        child_ids: Vec::new(),
        attached: true,
        disposed: false,
    });
    let clone_uid = scene.get_node(clone_id)?.unique_id;
    tables.record(original_uid, clone_uid, EntityHandle::Node(clone_id));

    remap_morph_targets(scene, original_id, clone_id, tables);

    if parent.is_some() {
        scene.set_node_parent(clone_id, parent);
    }

    for child_id in child_ids {
        clone_hierarchy(scene, child_id, Some(clone_id), options, tables);
    }

    Some(clone_id)
}

/// The shallow mesh clone carried the original morph targets over; give each
/// cloned target a fresh identifier and record the pair. Targets share the
/// entity identifier space, so animation remapping finds them like nodes.
fn remap_morph_targets(
    scene: &mut Scene,
    original_id: NodeId,
    clone_id: NodeId,
    tables: &mut CloneTables,
) {
    let num_targets = scene
        .get_node(clone_id)
        .and_then(|node| node.mesh.as_ref())
        .and_then(|mesh| mesh.morph_targets.as_ref())
        .map(|manager| manager.num_targets())
        .unwrap_or(0);

    for index in 0..num_targets {
        let original_target_uid = scene
            .get_node(original_id)
            .and_then(|node| node.mesh.as_ref())
            .and_then(|mesh| mesh.morph_targets.as_ref())
            .and_then(|manager| manager.targets.get(index))
            .map(|target| target.unique_id);

        let new_uid = scene.take_unique_id();
        if let Some(target) = scene
            .get_node_mut(clone_id)
            .and_then(|node| node.mesh.as_mut())
            .and_then(|mesh| mesh.morph_targets.as_mut())
            .and_then(|manager| manager.targets.get_mut(index))
        {
            target.unique_id = new_uid;
        }

        if let Some(original_target_uid) = original_target_uid {
            tables.record(
                original_target_uid,
                new_uid,
                EntityHandle::MorphTarget {
                    node: clone_id,
                    index,
                },
            );
        }
    }
}

fn rewrite_bone_links(scene: &mut Scene, skeleton_id: SkeletonId, tables: &CloneTables) {
    let links: Vec<(usize, NodeId)> = match scene.get_skeleton(skeleton_id) {
        Some(skeleton) => skeleton
            .bones
            .iter()
            .enumerate()
            .filter_map(|(index, bone)| bone.linked_node.map(|node| (index, node)))
            .collect(),
        None => return,
    };

    let mut remapped: Vec<(usize, NodeId)> = Vec::new();
    for (index, original_node) in links {
        let Some(original_uid) = scene.get_node(original_node).map(|node| node.unique_id) else {
            continue;
        };
        // A link outside the instantiated set keeps driving the original node.
        if let Some(clone_node) = tables.resolve_node(original_uid) {
            remapped.push((index, clone_node));
        }
    }

    if let Some(skeleton) = scene.get_skeleton_mut(skeleton_id) {
        for (index, node) in remapped {
            if let Some(bone) = skeleton.bones.get_mut(index) {
                bone.linked_node = Some(node);
            }
        }
    }
}
