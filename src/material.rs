use std::sync::Arc;

use glam::Vec4;

use crate::texture::Texture;

/// PBR material definition, shared between meshes through `Arc`; hierarchy
/// clones reference the same material rather than copying it.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color_factor: Vec4,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub base_color_texture: Option<Arc<Texture>>,
    pub normal_texture: Option<Arc<Texture>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color_factor: Vec4::ONE,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            base_color_texture: None,
            normal_texture: None,
        }
    }
}
