use anyhow::Result;

use scenekit::container::InstantiateOptions;
use scenekit::loader::load_gltf_container;
use scenekit::scene_graph::Scene;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/can/can.gltf".to_string());

    let mut scene = Scene::new();
    let container = load_gltf_container(&mut scene, &path)?;

    for index in 0..2 {
        let rename = move |name: &str| format!("{name} (instance {index})");
        let options = InstantiateOptions {
            name_function: Some(&rename),
        };
        let entries = container.instantiate_models_to_scene(&mut scene, &options);

        log::info!(
            "Instance {index}: {} root nodes, {} skeletons, {} animation groups",
            entries.root_nodes.len(),
            entries.skeletons.len(),
            entries.animation_groups.len()
        );
    }

    scene.update_transforms();

    Ok(())
}
