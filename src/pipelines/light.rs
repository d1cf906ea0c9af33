//! Light uniforms and the shadow map resources.
//!
//! The scene carries one ambient fill term and one shadow-casting
//! directional light. Both live in a single uniform block together with the
//! light-space matrix used to render and sample the shadow map.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, data_structures::texture::Texture};

pub const SHADOW_MAP_SIZE: u32 = 1024;
/// Half extent of the orthographic shadow frustum around the origin.
pub const SHADOW_FRUSTUM_EXTENT: f32 = 7.0;
pub const SHADOW_NEAR: f32 = 0.1;
pub const SHADOW_FAR: f32 = 15.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    light_view_proj: [[f32; 4]; 4],
    // rgb with the intensity packed into the fourth component, which also
    // keeps every field on a 16 byte boundary
    ambient: [f32; 4],
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
}

impl LightUniform {
    pub fn new(ambient_intensity: f32, sun_intensity: f32, sun_position: Vector3<f32>) -> Self {
        let view = Matrix4::look_at_rh(
            Point3::from_vec(sun_position),
            Point3::origin(),
            Vector3::unit_y(),
        );
        let proj = cgmath::ortho(
            -SHADOW_FRUSTUM_EXTENT,
            SHADOW_FRUSTUM_EXTENT,
            -SHADOW_FRUSTUM_EXTENT,
            SHADOW_FRUSTUM_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        let direction = (-sun_position).normalize();
        Self {
            light_view_proj: (OPENGL_TO_WGPU_MATRIX * proj * view).into(),
            ambient: [1.0, 1.0, 1.0, ambient_intensity],
            sun_direction: [direction.x, direction.y, direction.z, 0.0],
            sun_color: [1.0, 1.0, 1.0, sun_intensity],
        }
    }

    pub fn light_view_proj(&self) -> Matrix4<f32> {
        self.light_view_proj.into()
    }
}

/// Layout for the forward pass: uniform block, shadow map, comparison sampler.
pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

/// Layout for the shadow pass itself, which only needs the uniform block.
pub fn shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("shadow_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow_bind_group: wgpu::BindGroup,
    pub shadow_bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_map =
            Texture::create_depth_texture(device, [SHADOW_MAP_SIZE, SHADOW_MAP_SIZE], "shadow_map");
        let shadow_sampler = shadow_map
            .sampler
            .clone()
            .expect("depth textures always carry a comparison sampler");

        let bind_group_layout = bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
            label: Some("light_bind_group"),
        });

        let shadow_bind_group_layout = shadow_bind_group_layout(device);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });

        Self {
            uniform,
            buffer,
            shadow_map,
            bind_group,
            bind_group_layout,
            shadow_bind_group,
            shadow_bind_group_layout,
        }
    }
}
