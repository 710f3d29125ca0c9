use std::sync::Arc;

use glam::{Vec2, Vec3};
use gltf::buffer;
use itertools::izip;

use crate::material::Material;
use crate::morph::MorphTargetManager;
use crate::scene_graph::node::NodeId;
use crate::skeleton::SkeletonId;

#[derive(Copy, Clone, Debug)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

pub struct GeometryPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Heavy vertex data, shared between mesh nodes through `Arc`. A hierarchy
/// clone duplicates the node graph only; geometry is never copied.
pub struct Geometry {
    pub name: String,
    pub primitives: Vec<GeometryPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Geometry {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Geometry> {
        let mut geometry = Geometry {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(anyhow::anyhow!(
                    "Unsupported primitive mode: {:?}",
                    primitive.mode()
                ));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| anyhow::anyhow!("Primitive without positions: {}", geometry.name))?
                .map(Vec3::from)
                .collect::<Vec<_>>();

            // Normals and UVs are optional in glTF; fill with defaults so the
            // zipped vertex stream stays aligned.
            let normals = reader
                .read_normals()
                .map(|normals| normals.map(Vec3::from).collect::<Vec<_>>())
                .unwrap_or_else(|| vec![Vec3::Z; positions.len()]);

            let tex_coords = reader
                .read_tex_coords(0)
                .map(|tex_coords| tex_coords.into_f32().map(Vec2::from).collect::<Vec<_>>())
                .unwrap_or_else(|| vec![Vec2::ZERO; positions.len()]);

            let vertices = izip!(positions, normals, tex_coords)
                .map(|(position, normal, tex_coords)| Vertex {
                    position,
                    normal,
                    tex_coords,
                })
                .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertices.len() as u32).collect(),
            };

            geometry.primitives.push(GeometryPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        if geometry.primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", geometry.name));
        }

        Ok(geometry)
    }
}

/// Mesh payload of a [`SceneNode`](crate::scene_graph::SceneNode). Geometry
/// and material are shared; skeleton binding and morph targets belong to this
/// mesh alone.
#[derive(Clone)]
pub struct MeshData {
    pub geometry: Arc<Geometry>,
    pub material: Option<Arc<Material>>,
    pub skeleton: Option<SkeletonId>,
    pub morph_targets: Option<MorphTargetManager>,
    /// Set on instanced copies; instances follow their source mesh and are
    /// skipped when skeleton bindings are rewritten.
    pub source: Option<NodeId>,
}

impl MeshData {
    pub fn new(geometry: Arc<Geometry>) -> Self {
        Self {
            geometry,
            material: None,
            skeleton: None,
            morph_targets: None,
            source: None,
        }
    }

    pub fn is_instance(&self) -> bool {
        self.source.is_some()
    }
}
