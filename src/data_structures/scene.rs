//! The scene: staged models, the floor, and ground-aligned placement.
//!
//! Models arrive as decoded [`CpuScene`]s in arbitrary order. Staging is
//! independent per model: apply the uniform scale, measure the bounding box,
//! shift the subtree so its lowest point touches y = 0, then apply the
//! placement offset and rotation. Insertion order never affects the result.

use cgmath::{Deg, One, Quaternion, Rotation3, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{DrawModel, Model},
    },
    resources::{self, CpuScene},
};

/// Axis-aligned bounding box over a model's geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn include(&mut self, p: Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(mut self, other: &Aabb) -> Self {
        if !other.is_empty() {
            self.include(other.min);
            self.include(other.max);
        }
        self
    }

    /// The box of this box's eight corners pushed through a transform.
    pub fn transformed(&self, transform: &Instance) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb::empty();
        for &x in &[self.min.x, self.max.x] {
            for &y in &[self.min.y, self.max.y] {
                for &z in &[self.min.z, self.max.z] {
                    out.include(transform.transform_point(Vector3::new(x, y, z)));
                }
            }
        }
        out
    }
}

/// Where and how large a loaded model should stand in the scene.
#[derive(Clone, Debug)]
pub struct Placement {
    pub scale: f32,
    /// X/Z offset on the floor. The Y coordinate is always computed from the
    /// model's bounds so the subtree rests on the ground.
    pub offset: (f32, f32),
    pub rotation_y: Deg<f32>,
}

impl Placement {
    pub fn new(scale: f32, offset: (f32, f32), rotation_y: Deg<f32>) -> Self {
        Self {
            scale,
            offset,
            rotation_y,
        }
    }

    /// Resolve the final transform for a model with the given local bounds.
    ///
    /// The bounding box is measured after scaling but before rotation, the
    /// way a world-space box query would see the freshly scaled subtree.
    pub fn resolve(&self, bounds: &Aabb) -> Instance {
        let scaled = Instance {
            scale: Vector3::new(self.scale, self.scale, self.scale),
            ..Default::default()
        };
        let grounded = bounds.transformed(&scaled);
        let lift = if grounded.is_empty() {
            0.0
        } else {
            -grounded.min.y
        };
        Instance {
            position: Vector3::new(self.offset.0, lift, self.offset.1),
            rotation: Quaternion::from_angle_y(self.rotation_y),
            scale: Vector3::new(self.scale, self.scale, self.scale),
        }
    }
}

/// A model in the scene: GPU buffers plus the transform that staged it.
#[derive(Debug)]
pub struct StagedModel {
    pub model: Model,
    pub instance_buffer: wgpu::Buffer,
    pub transform: Instance,
    /// Local-space bounds, before the staging transform.
    pub bounds: Aabb,
    pub receives_shadow: bool,
}

impl StagedModel {
    pub fn new(
        device: &wgpu::Device,
        model: Model,
        transform: Instance,
        bounds: Aabb,
        receives_shadow: bool,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[transform.to_raw(receives_shadow)]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            model,
            instance_buffer,
            transform,
            bounds,
            receives_shadow,
        }
    }

    pub fn world_bounds(&self) -> Aabb {
        self.bounds.transformed(&self.transform)
    }

    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw_model_instanced(&self.model, 0..1, camera_bind_group, light_bind_group);
    }

    pub fn draw_depth<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        shadow_bind_group: &'a wgpu::BindGroup,
    ) {
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw_model_depth(&self.model, 0..1, shadow_bind_group);
    }
}

/// The transform that parks a floor slab of the given dimensions with its
/// top face exactly at y = 0.
pub fn floor_transform(dimensions: [f32; 3]) -> Instance {
    Instance {
        position: Vector3::new(0.0, -dimensions[1] / 2.0, 0.0),
        rotation: Quaternion::one(),
        scale: Vector3::new(1.0, 1.0, 1.0),
    }
}

/// Root container: background colour, the floor, and every model that has
/// finished loading. Insertion-only; teardown frees the lot.
#[derive(Debug)]
pub struct Scene {
    pub background: wgpu::Color,
    pub floor: StagedModel,
    pub models: Vec<StagedModel>,
}

impl Scene {
    /// Build the scene with its synchronous content: the floor slab with a
    /// placeholder material. The real floor texture binds whenever its load
    /// completes; nothing waits for it.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        floor_dimensions: [f32; 3],
    ) -> Self {
        let (model, bounds) =
            resources::mesh::upload_box(device, queue, material_layout, floor_dimensions);
        let floor = StagedModel::new(device, model, floor_transform(floor_dimensions), bounds, true);
        Self {
            background: wgpu::Color::WHITE,
            floor,
            models: Vec::new(),
        }
    }

    /// Upload a decoded model and insert it, ground-aligned, at its placement.
    pub fn stage(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        cpu: CpuScene,
        placement: &Placement,
    ) {
        let bounds = cpu.bounds();
        let transform = placement.resolve(&bounds);
        let model = resources::upload_scene(device, queue, material_layout, &cpu);
        self.models
            .push(StagedModel::new(device, model, transform, bounds, false));
    }

    /// Swap the floor material for the freshly decoded texture.
    pub fn bind_floor_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        rgba: &image::RgbaImage,
    ) {
        use crate::data_structures::{model::Material, texture::Texture};

        let texture = Texture::from_rgba(
            device,
            queue,
            rgba.as_raw(),
            rgba.dimensions(),
            Some("floor texture"),
        );
        self.floor.model.materials[0] = Material::new(device, "floor", texture, material_layout);
    }

    /// Forward pass: floor first, then every staged model.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        self.floor
            .draw(render_pass, camera_bind_group, light_bind_group);
        for staged in &self.models {
            staged.draw(render_pass, camera_bind_group, light_bind_group);
        }
    }

    /// Shadow pass: models only. The floor receives shadows but casts none
    /// (there is nothing underneath it to shade).
    pub fn draw_depth<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        shadow_bind_group: &'a wgpu::BindGroup,
    ) {
        for staged in &self.models {
            staged.draw_depth(render_pass, shadow_bind_group);
        }
    }
}
