//! Populates an [`AssetContainer`] from a glTF document. Entities are created
//! detached; call `add_all_to_scene` or `instantiate_models_to_scene` to put
//! them in play.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::buffer;
use gltf::texture::{MagFilter, MinFilter, WrappingMode};

use crate::animation::{Animation, AnimationChannel, AnimationGroup, AnimationTarget, Keyframe};
use crate::container::AssetContainer;
use crate::material::Material;
use crate::mesh::{Geometry, MeshData};
use crate::morph::{MorphTarget, MorphTargetManager};
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;
use crate::skeleton::{Bone, Skeleton, SkeletonId};
use crate::texture::{SamplingMode, Texture, WrapMode};

struct LoadContext {
    file_name: String,
    geometry_by_mesh: HashMap<usize, Arc<Geometry>>,
    materials: HashMap<usize, Arc<Material>>,
    node_map: HashMap<usize, NodeId>,
    /// Mesh nodes whose skin binding is patched once skeletons exist.
    pending_skins: Vec<(NodeId, usize)>,
    morph_target_counts: HashMap<usize, usize>,
}

pub fn load_gltf_container(
    scene: &mut Scene,
    path: impl AsRef<Path>,
) -> anyhow::Result<AssetContainer> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)
        .with_context(|| format!("Failed to import glTF from {}", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("glTF")
        .to_string();

    let mut container = AssetContainer::new();

    let textures = load_textures(&document, &file_name);
    let materials = load_materials(&document, &textures);
    container.textures = textures;
    container.materials = materials.values().cloned().collect();

    let mut ctx = LoadContext {
        file_name,
        geometry_by_mesh: HashMap::new(),
        materials,
        node_map: HashMap::new(),
        pending_skins: Vec::new(),
        morph_target_counts: HashMap::new(),
    };

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .with_context(|| format!("glTF '{}' contains no scenes", ctx.file_name))?;

    for node in gltf_scene.nodes() {
        spawn_gltf_node(scene, &mut container, &mut ctx, &buffers, &node, None)?;
    }

    load_skeletons(scene, &mut container, &mut ctx, &document);
    load_animation_groups(scene, &mut container, &ctx, &document, &buffers);

    log::info!(
        "Loaded '{}': {} nodes, {} meshes, {} skeletons, {} animation groups",
        ctx.file_name,
        container.nodes.len(),
        container.meshes.len(),
        container.skeletons.len(),
        container.animation_groups.len()
    );

    Ok(container)
}

fn load_textures(document: &gltf::Document, file_name: &str) -> Vec<Arc<Texture>> {
    document
        .textures()
        .map(|texture| {
            let name = texture
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("{} texture {}", file_name, texture.index()));

            let mut runtime = Texture::new(name);
            let sampler = texture.sampler();
            runtime.wrap_u = wrap_mode(sampler.wrap_s());
            runtime.wrap_v = wrap_mode(sampler.wrap_t());
            runtime.sampling_mode = sampling_mode(sampler.mag_filter(), sampler.min_filter());
            Arc::new(runtime)
        })
        .collect()
}

fn load_materials(
    document: &gltf::Document,
    textures: &[Arc<Texture>],
) -> HashMap<usize, Arc<Material>> {
    let mut materials = HashMap::new();

    for material in document.materials() {
        // The implicit default material stays None on the mesh side.
        let Some(index) = material.index() else {
            continue;
        };

        let pbr = material.pbr_metallic_roughness();
        let mut out = Material::new(material.name().unwrap_or("Unnamed material"));
        out.base_color_factor = Vec4::from_array(pbr.base_color_factor());
        out.metallic_factor = pbr.metallic_factor();
        out.roughness_factor = pbr.roughness_factor();
        out.base_color_texture = pbr
            .base_color_texture()
            .and_then(|info| textures.get(info.texture().index()).cloned());
        out.normal_texture = material
            .normal_texture()
            .and_then(|normal| textures.get(normal.texture().index()).cloned());

        materials.insert(index, Arc::new(out));
    }

    materials
}

fn spawn_gltf_node(
    scene: &mut Scene,
    container: &mut AssetContainer,
    ctx: &mut LoadContext,
    buffers: &[buffer::Data],
    node: &gltf::Node,
    parent: Option<NodeId>,
) -> anyhow::Result<NodeId> {
    let node_name = node.name().unwrap_or("Unnamed").to_string();
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform::from_trs(
        Vec3::from(translation),
        Quat::from_array(rotation),
        Vec3::from(scale),
    );

    let mut mesh_data = None;
    if let Some(mesh) = node.mesh() {
        let mesh_index = mesh.index();

        let geometry = match ctx.geometry_by_mesh.get(&mesh_index).cloned() {
            Some(geometry) => geometry,
            None => {
                let mesh_name = mesh
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{} (Mesh)", node_name));
                let geometry = Arc::new(Geometry::from_gltf(mesh_name, mesh.clone(), buffers)?);
                ctx.geometry_by_mesh.insert(mesh_index, Arc::clone(&geometry));
                geometry
            }
        };

        let material = mesh
            .primitives()
            .next()
            .and_then(|primitive| primitive.material().index())
            .and_then(|index| ctx.materials.get(&index).cloned());

        let mut data = MeshData::new(geometry);
        data.material = material;
        data.morph_targets = load_morph_targets(scene, &mesh, buffers, &node_name);
        if let Some(manager) = &data.morph_targets {
            ctx.morph_target_counts
                .insert(node.index(), manager.num_targets());
        }
        mesh_data = Some(data);
    }

    let is_mesh = mesh_data.is_some();
    let node_id = scene.add_node(SceneNode {
        name: node_name,
        unique_id: 0,
        transform,
        mesh: mesh_data,
        parent_id: None,
        child_ids: Vec::new(),
        attached: false,
        disposed: false,
    });

    ctx.node_map.insert(node.index(), node_id);
    if let Some(skin) = node.skin() {
        ctx.pending_skins.push((node_id, skin.index()));
    }
    if is_mesh {
        container.meshes.push(node_id);
    } else {
        container.nodes.push(node_id);
    }

    if parent.is_some() {
        scene.set_node_parent(node_id, parent);
    }

    for child in node.children() {
        spawn_gltf_node(scene, container, ctx, buffers, &child, Some(node_id))?;
    }

    Ok(node_id)
}

fn load_morph_targets(
    scene: &mut Scene,
    mesh: &gltf::Mesh,
    buffers: &[buffer::Data],
    node_name: &str,
) -> Option<MorphTargetManager> {
    let primitive = mesh.primitives().next()?;
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let weights = mesh.weights().unwrap_or(&[]);

    let mut manager = MorphTargetManager::default();
    for (index, (positions, _normals, _tangents)) in reader.read_morph_targets().enumerate() {
        let position_deltas: Vec<Vec3> = positions
            .map(|deltas| deltas.map(Vec3::from).collect())
            .unwrap_or_default();

        manager.targets.push(MorphTarget {
            name: format!("{} target {}", node_name, index),
            unique_id: scene.take_unique_id(),
            weight: weights.get(index).copied().unwrap_or(0.0),
            position_deltas: Arc::from(position_deltas.into_boxed_slice()),
        });
    }

    if manager.targets.is_empty() {
        None
    } else {
        Some(manager)
    }
}

fn load_skeletons(
    scene: &mut Scene,
    container: &mut AssetContainer,
    ctx: &mut LoadContext,
    document: &gltf::Document,
) {
    let mut skeleton_by_skin: HashMap<usize, SkeletonId> = HashMap::new();

    for skin in document.skins() {
        let name = skin
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("{} skin {}", ctx.file_name, skin.index()));

        let joints: Vec<gltf::Node> = skin.joints().collect();
        if joints.is_empty() {
            log::warn!("Skin '{}' has no joints; skipping", name);
            continue;
        }

        let node_to_joint: HashMap<usize, usize> = joints
            .iter()
            .enumerate()
            .map(|(index, node)| (node.index(), index))
            .collect();

        let mut parent_by_joint: Vec<Option<usize>> = vec![None; joints.len()];
        for (parent_index, node) in joints.iter().enumerate() {
            for child in node.children() {
                if let Some(&child_joint) = node_to_joint.get(&child.index()) {
                    parent_by_joint[child_joint] = Some(parent_index);
                }
            }
        }

        let bones = joints
            .iter()
            .enumerate()
            .map(|(index, joint)| Bone {
                name: joint
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("joint_{index}")),
                parent: parent_by_joint[index],
                rest_local: Mat4::from_cols_array_2d(&joint.transform().matrix()),
                linked_node: ctx.node_map.get(&joint.index()).copied(),
            })
            .collect();

        let mut skeleton = Skeleton::new(name);
        skeleton.bones = bones;
        skeleton.attached = false;

        let skeleton_id = scene.add_skeleton(skeleton);
        skeleton_by_skin.insert(skin.index(), skeleton_id);
        container.skeletons.push(skeleton_id);
    }

    for &(node_id, skin_index) in &ctx.pending_skins {
        if let Some(&skeleton_id) = skeleton_by_skin.get(&skin_index) {
            if let Some(mesh) = scene.get_node_mut(node_id).and_then(|node| node.mesh.as_mut()) {
                mesh.skeleton = Some(skeleton_id);
            }
        }
    }
}

fn load_animation_groups(
    scene: &mut Scene,
    container: &mut AssetContainer,
    ctx: &LoadContext,
    document: &gltf::Document,
    buffers: &[buffer::Data],
) {
    for (animation_index, animation) in document.animations().enumerate() {
        let group_name = animation
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("animation {animation_index}"));

        let mut group = AnimationGroup::new(group_name.clone());
        group.attached = false;

        for channel in animation.channels() {
            let target_node_index = channel.target().node().index();
            let Some(&target_node) = ctx.node_map.get(&target_node_index) else {
                log::debug!(
                    "Animation '{}' targets node {} outside the loaded scene; skipping channel",
                    group_name,
                    target_node_index
                );
                continue;
            };

            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };

            match outputs {
                ReadOutputs::Translations(values) => {
                    let keys = zip_keyframes(&times, values.map(Vec3::from));
                    group.add_targeted_animation(
                        Arc::new(Animation {
                            name: format!("{group_name} translation"),
                            channel: AnimationChannel::Translation(keys),
                        }),
                        AnimationTarget::Node(target_node),
                    );
                }
                ReadOutputs::Scales(values) => {
                    let keys = zip_keyframes(&times, values.map(Vec3::from));
                    group.add_targeted_animation(
                        Arc::new(Animation {
                            name: format!("{group_name} scaling"),
                            channel: AnimationChannel::Scaling(keys),
                        }),
                        AnimationTarget::Node(target_node),
                    );
                }
                ReadOutputs::Rotations(rotations) => {
                    let quats = rotations
                        .into_f32()
                        .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w).normalize());
                    let keys = zip_keyframes(&times, quats);
                    group.add_targeted_animation(
                        Arc::new(Animation {
                            name: format!("{group_name} rotation"),
                            channel: AnimationChannel::Rotation(keys),
                        }),
                        AnimationTarget::Node(target_node),
                    );
                }
                ReadOutputs::MorphTargetWeights(weights) => {
                    let num_targets = ctx
                        .morph_target_counts
                        .get(&target_node_index)
                        .copied()
                        .unwrap_or(0);
                    if num_targets == 0 {
                        continue;
                    }

                    // The flat weight stream interleaves one value per target
                    // per keyframe; split it into one track per target.
                    let flat: Vec<f32> = weights.into_f32().collect();
                    for target_index in 0..num_targets {
                        let keys = times
                            .iter()
                            .enumerate()
                            .filter_map(|(key_index, &time)| {
                                flat.get(key_index * num_targets + target_index)
                                    .map(|&value| Keyframe { time, value })
                            })
                            .collect();
                        group.add_targeted_animation(
                            Arc::new(Animation {
                                name: format!("{group_name} weight {target_index}"),
                                channel: AnimationChannel::Weight(keys),
                            }),
                            AnimationTarget::MorphTarget {
                                node: target_node,
                                index: target_index,
                            },
                        );
                    }
                }
            }
        }

        if group.targeted_animations.is_empty() {
            continue;
        }

        let group_id = scene.add_animation_group(group);
        container.animation_groups.push(group_id);
    }
}

fn zip_keyframes<T>(times: &[f32], values: impl Iterator<Item = T>) -> Vec<Keyframe<T>> {
    times
        .iter()
        .zip(values)
        .map(|(&time, value)| Keyframe { time, value })
        .collect()
}

fn wrap_mode(mode: WrappingMode) -> WrapMode {
    match mode {
        WrappingMode::Repeat => WrapMode::Wrap,
        WrappingMode::ClampToEdge => WrapMode::Clamp,
        WrappingMode::MirroredRepeat => WrapMode::Mirror,
    }
}

fn sampling_mode(mag: Option<MagFilter>, min: Option<MinFilter>) -> SamplingMode {
    match (mag, min) {
        (Some(MagFilter::Nearest), _) => SamplingMode::Nearest,
        (_, Some(MinFilter::LinearMipmapLinear) | Some(MinFilter::NearestMipmapLinear) | None) => {
            SamplingMode::Trilinear
        }
        _ => SamplingMode::Bilinear,
    }
}
