//! Render pipeline definitions.
//!
//! - `scene` is the forward pass for every staged model and the floor
//! - `shadow` is the depth-only pass into the light's shadow map
//! - `light` holds the light uniform block and shadow map resources

pub mod light;
pub mod scene;
pub mod shadow;

/// The fixed set of pipelines the viewer renders with.
#[derive(Debug)]
pub struct Pipelines {
    pub scene: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self {
            scene: scene::mk_scene_pipeline(device, color_format),
            shadow: shadow::mk_shadow_pipeline(device),
        }
    }
}
