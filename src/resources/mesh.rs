//! Primitive geometry and GPU mesh upload.
//!
//! The floor is the only procedural geometry in the scene: an axis-aligned
//! box with per-face normals and 0..1 texture coordinates per face.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    model::{self, ModelVertex},
    scene::Aabb,
    texture::Texture,
};

/// Build box geometry centred on the origin.
///
/// Returns 24 vertices (four per face so normals stay hard) and 36 indices.
pub fn box_mesh(dimensions: [f32; 3]) -> (Vec<ModelVertex>, Vec<u32>) {
    let hx = dimensions[0] / 2.0;
    let hy = dimensions[1] / 2.0;
    let hz = dimensions[2] / 2.0;

    // Corners per face wind counter-clockwise seen from outside the box.
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0],  [[hx, -hy, hz],   [hx, -hy, -hz],  [hx, hy, -hz],  [hx, hy, hz]]),
        ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz],  [-hx, hy, hz],  [-hx, hy, -hz]]),
        ([0.0, 1.0, 0.0],  [[-hx, hy, hz],   [hx, hy, hz],    [hx, hy, -hz],  [-hx, hy, -hz]]),
        ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz],  [hx, -hy, hz],  [-hx, -hy, hz]]),
        ([0.0, 0.0, 1.0],  [[-hx, -hy, hz],  [hx, -hy, hz],   [hx, hy, hz],   [-hx, hy, hz]]),
        ([0.0, 0.0, -1.0], [[hx, -hy, -hz],  [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
    ];
    const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(FACE_UVS) {
            vertices.push(ModelVertex {
                position: corner,
                tex_coords: uv,
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// Create GPU buffers for a mesh.
pub fn upload_mesh(
    device: &wgpu::Device,
    name: &str,
    vertices: &[ModelVertex],
    indices: &[u32],
    material: usize,
) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material,
    }
}

/// Upload a box with a solid white material (swapped out once a texture
/// arrives) and report its local bounds.
pub fn upload_box(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
    dimensions: [f32; 3],
) -> (model::Model, Aabb) {
    let (vertices, indices) = box_mesh(dimensions);
    let mut bounds = Aabb::empty();
    for v in &vertices {
        bounds.include(v.position.into());
    }

    let mesh = upload_mesh(device, "box", &vertices, &indices, 0);
    let placeholder = Texture::create_solid(1, 1, [255, 255, 255, 255], device, queue);
    let material = model::Material::new(device, "box placeholder", placeholder, material_layout);

    (
        model::Model {
            meshes: vec![mesh],
            materials: vec![material],
        },
        bounds,
    )
}
