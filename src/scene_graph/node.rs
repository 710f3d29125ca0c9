use id_arena::Id;

use crate::mesh::MeshData;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<SceneNode>;

/// A transform node, or a mesh when a [`MeshData`] payload is present.
///
/// `unique_id` is assigned by [`Scene::add_node`] and is never reused for the
/// lifetime of the owning scene; disposal tombstones the node instead of
/// freeing its slot.
pub struct SceneNode {
    pub name: String,
    pub unique_id: u64,
    pub transform: Transform,
    pub mesh: Option<MeshData>,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
    pub attached: bool,
    pub disposed: bool,
}

impl SceneNode {
    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a SceneNode> {
        self.parent_id.and_then(|id| scene.get_node(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b SceneNode> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_node(*id))
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            unique_id: 0,
            transform: Transform::identity(),
            mesh: None,
            parent_id: None,
            child_ids: Vec::new(),
            attached: true,
            disposed: false,
        }
    }
}
