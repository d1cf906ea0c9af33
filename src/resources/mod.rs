use std::io::{BufReader, Cursor};

use anyhow::{Context, Result};

use crate::{
    data_structures::{
        instance::Instance,
        model::{self, ModelVertex},
        scene::Aabb,
        texture::Texture,
    },
    resources::animation::{AnimationClip, Keyframes},
};

/**
 * This module contains all logic for loading scenes/textures/etc. from external files.
 */
pub mod animation;
pub(crate) mod draco;
pub mod mesh;
pub mod texture;

pub use texture::{diffuse_layout, load_binary, load_rgba};

/// A material as decoded on a background task, before any GPU upload.
pub struct CpuMaterial {
    pub name: String,
    pub rgba: Option<image::RgbaImage>,
    /// Solid colour stand-in when the material has no texture, derived from
    /// the base colour factor.
    pub fallback: [u8; 4],
}

/// One primitive's worth of geometry with its node transform baked in.
pub struct CpuMesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

/// A fully decoded model subtree: meshes flattened into world space of the
/// container, materials, and whatever animation clips the file carried.
pub struct CpuScene {
    pub meshes: Vec<CpuMesh>,
    pub materials: Vec<CpuMaterial>,
    pub clips: Vec<AnimationClip>,
}

impl CpuScene {
    /// Bounds over every vertex of every mesh, in the subtree's local space.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for mesh in &self.meshes {
            for vertex in &mesh.vertices {
                bounds.include(vertex.position.into());
            }
        }
        bounds
    }
}

fn read_primitive(
    prim: &gltf::mesh::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> Result<draco::DecodedPrimitive> {
    let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("primitive has no POSITION attribute")?
        .collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|it| it.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|ir| ir.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    Ok(draco::DecodedPrimitive {
        positions,
        normals,
        tex_coords,
        indices,
    })
}

fn bake_vertices(world: &Instance, decoded: &draco::DecodedPrimitive) -> Vec<ModelVertex> {
    decoded
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let position = world.transform_point((*p).into());
            let normal = world
                .transform_direction(decoded.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]).into());
            ModelVertex {
                position: position.into(),
                tex_coords: decoded.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: normal.into(),
            }
        })
        .collect()
}

/// Fetch and decode a glTF container into a [`CpuScene`].
///
/// Handles both plain and `KHR_draco_mesh_compression` primitives. Node
/// transforms are folded into the vertices so the result is a flat list of
/// meshes in the container's own space; the staging transform is applied
/// later, per instance.
pub async fn load_scene_gltf(file_name: &str) -> Result<CpuScene> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("parsing glTF container {}", file_name))?;

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or("unnamed material").to_string();
        let pbr = material.pbr_metallic_roughness();
        let factor = pbr.base_color_factor();
        let fallback = [
            (factor[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (factor[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (factor[2].clamp(0.0, 1.0) * 255.0).round() as u8,
            (factor[3].clamp(0.0, 1.0) * 255.0).round() as u8,
        ];
        let rgba = match pbr.base_color_texture() {
            Some(info) => {
                let bytes: Vec<u8> = match info.texture().source().source() {
                    gltf::image::Source::View { view, .. } => {
                        let data = buffer_data
                            .get(view.buffer().index())
                            .context("texture buffer index out of range")?;
                        data[view.offset()..view.offset() + view.length()].to_vec()
                    }
                    gltf::image::Source::Uri { uri, .. } => load_binary(uri).await?,
                };
                let img = image::load_from_memory(&bytes)
                    .with_context(|| format!("decoding texture of material {}", name))?;
                Some(img.to_rgba8())
            }
            None => None,
        };
        materials.push(CpuMaterial {
            name,
            rgba,
            fallback,
        });
    }
    if materials.is_empty() {
        materials.push(CpuMaterial {
            name: "default".to_string(),
            rgba: None,
            fallback: [255, 255, 255, 255],
        });
    }

    // Load animation clips
    let mut clips = Vec::new();
    for anim in gltf.animations() {
        for channel in anim.channels() {
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => Vec::new(),
                None => {
                    log::warn!("no inputs in animation channel {}", channel.index());
                    Vec::new()
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
                None => {
                    log::warn!("no keyframes in animation channel {}", channel.index());
                    Keyframes::Other
                }
            };
            clips.push(AnimationClip {
                name: anim.name().unwrap_or("Default").to_string(),
                keyframes,
                timestamps,
            });
        }
    }

    // Walk the node hierarchy with accumulated transforms; recursion would
    // not mix with the awaits inside the loop.
    let mut pending: Vec<(gltf::Node<'_>, Instance)> = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            pending.push((node, Instance::default()));
        }
    }

    let mut meshes = Vec::new();
    while let Some((node, parent)) = pending.pop() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let local = Instance {
            position: translation.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        };
        let world = &parent * &local;

        if let Some(mesh) = node.mesh() {
            for prim in mesh.primitives() {
                let decoded = if prim
                    .extension_value("KHR_draco_mesh_compression")
                    .is_some()
                {
                    draco::decode_primitive(&gltf.document, &buffer_data, &prim).await?
                } else {
                    read_primitive(&prim, &buffer_data)?
                };
                let material = prim
                    .material()
                    .index()
                    .unwrap_or(0)
                    .min(materials.len() - 1);
                meshes.push(CpuMesh {
                    name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                    vertices: bake_vertices(&world, &decoded),
                    indices: decoded.indices,
                    material,
                });
            }
        }

        for child in node.children() {
            pending.push((child, world.clone()));
        }
    }

    Ok(CpuScene {
        meshes,
        materials,
        clips,
    })
}

/// Create the GPU-side [`Model`](model::Model) for a decoded scene.
pub fn upload_scene(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
    cpu: &CpuScene,
) -> model::Model {
    let materials = cpu
        .materials
        .iter()
        .map(|m| {
            let texture = match &m.rgba {
                Some(img) => Texture::from_rgba(
                    device,
                    queue,
                    img.as_raw(),
                    img.dimensions(),
                    Some(&m.name),
                ),
                None => Texture::create_solid(1, 1, m.fallback, device, queue),
            };
            model::Material::new(device, &m.name, texture, material_layout)
        })
        .collect();

    let meshes = cpu
        .meshes
        .iter()
        .map(|m| mesh::upload_mesh(device, &m.name, &m.vertices, &m.indices, m.material))
        .collect();

    model::Model { meshes, materials }
}
