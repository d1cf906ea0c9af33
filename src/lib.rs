//! glade
//!
//! A lightweight, cross-platform scene viewer for native and WASM targets.
//! The crate stages glTF models (including `KHR_draco_mesh_compression`
//! primitives) on a textured floor, lights the result with an ambient fill
//! and one shadow-casting directional light, and renders it behind a damped
//! orbit camera. Models are decoded on background tasks and slot into the
//! scene whenever they arrive; the render loop runs from the first frame.
//!
//! High-level modules
//! - `camera`: look-at camera, perspective projection, orbit controller and uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, the scene)
//! - `pipelines`: render pipeline definitions (forward scene pass, shadow pass, lights)
//! - `resources`: helpers to load and decode glTF scenes and textures
//! - `viewer`: the application shell and per-frame loop
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
