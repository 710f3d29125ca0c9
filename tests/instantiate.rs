use std::sync::Arc;

use scenekit::container::{AssetContainer, InstantiateOptions};
use scenekit::mesh::{Geometry, MeshData};
use scenekit::scene_graph::{Scene, SceneNode};

fn transform_node(name: &str) -> SceneNode {
    SceneNode {
        name: name.to_string(),
        ..Default::default()
    }
}

fn mesh_node(name: &str, geometry: &Arc<Geometry>) -> SceneNode {
    SceneNode {
        name: name.to_string(),
        mesh: Some(MeshData::new(Arc::clone(geometry))),
        ..Default::default()
    }
}

/// One root transform node with two mesh children: instantiating produces one
/// root clone whose two children are clones parented under it, and empty
/// skeleton and animation-group result lists.
#[test]
fn root_with_two_mesh_children() {
    let mut scene = Scene::new();
    let mut container = AssetContainer::new();

    let geometry = Arc::new(Geometry {
        name: "shared".to_string(),
        primitives: Vec::new(),
    });

    let root = scene.add_node(transform_node("root"));
    let left = scene.add_node(mesh_node("left", &geometry));
    let right = scene.add_node(mesh_node("right", &geometry));
    scene.set_node_parent(left, Some(root));
    scene.set_node_parent(right, Some(root));

    container.add_node(&scene, root);
    container.add_node(&scene, left);
    container.add_node(&scene, right);

    let entries = container.instantiate_models_to_scene(&mut scene, &InstantiateOptions::default());

    assert_eq!(entries.root_nodes.len(), 1);
    assert!(entries.skeletons.is_empty());
    assert!(entries.animation_groups.is_empty());

    let root_clone_id = entries.root_nodes[0];
    let root_clone = scene.get_node(root_clone_id).unwrap();
    assert!(root_clone.parent_id.is_none());
    assert_ne!(root_clone_id, root);
    assert_eq!(root_clone.child_ids.len(), 2);

    let original_ids = [root, left, right];
    for &child_id in &root_clone.child_ids {
        let child = scene.get_node(child_id).unwrap();
        assert!(!original_ids.contains(&child_id));
        assert_eq!(child.parent_id, Some(root_clone_id));
        assert!(child.is_mesh());
        // Geometry is shared, not copied.
        assert!(Arc::ptr_eq(&child.mesh.as_ref().unwrap().geometry, &geometry));
    }

    // Originals are untouched.
    assert_eq!(scene.get_node(root).unwrap().child_ids, vec![left, right]);
}
