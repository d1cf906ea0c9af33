use cgmath::Deg;
use glade::viewer::{self, FloorConfig, ModelConfig, SceneConfig};

fn main() -> anyhow::Result<()> {
    viewer::run(SceneConfig {
        models: vec![
            ModelConfig {
                path: "models/model.glb".to_string(),
                scale: 20.0,
                offset: (0.0, 0.0),
                rotation_y: Deg(90.0),
            },
            ModelConfig {
                path: "models/tree.glb".to_string(),
                scale: 10.0,
                offset: (10.0, -10.0),
                rotation_y: Deg(0.0),
            },
        ],
        floor: FloorConfig {
            dimensions: [50.0, 1.0, 50.0],
            texture: "textures/floor.jpg".to_string(),
        },
    })
}
