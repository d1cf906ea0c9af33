//! Engine data structures: models, textures, instances and the scene.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-node transformation data
//! - `scene` is the staged scene: floor, loaded models, placement logic

pub mod instance;
pub mod model;
pub mod scene;
pub mod texture;
