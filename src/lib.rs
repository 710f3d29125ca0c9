pub mod animation;
pub mod container;
pub mod inspector;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod morph;
pub mod scene_graph;
pub mod skeleton;
pub mod texture;

pub use container::{AssetContainer, InstantiateOptions, InstantiatedEntries};
pub use scene_graph::{NodeId, Scene, SceneNode, Transform};
