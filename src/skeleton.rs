use glam::Mat4;
use id_arena::Id;

use crate::scene_graph::node::NodeId;

pub type SkeletonId = Id<Skeleton>;

#[derive(Clone)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub rest_local: Mat4,
    /// When set, the bone's transform is driven by an external scene node
    /// instead of its own rest matrix.
    pub linked_node: Option<NodeId>,
}

pub struct Skeleton {
    pub name: String,
    pub unique_id: u64,
    pub bones: Vec<Bone>,
    /// Mesh supplying the coordinate-space reference for bone matrices,
    /// independent of which meshes this skeleton deforms.
    pub override_mesh: Option<NodeId>,
    pub attached: bool,
    pub disposed: bool,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_id: 0,
            bones: Vec::new(),
            override_mesh: None,
            attached: true,
            disposed: false,
        }
    }

    /// Copy with a new name and no identifier yet; bone links still point at
    /// the original nodes until the instantiator rewrites them.
    pub fn clone_with_name(&self, name: impl Into<String>) -> Skeleton {
        Skeleton {
            name: name.into(),
            unique_id: 0,
            bones: self.bones.clone(),
            override_mesh: self.override_mesh,
            attached: true,
            disposed: false,
        }
    }
}
