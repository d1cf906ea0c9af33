use cgmath::Deg;
use glade::data_structures::model::ModelVertex;
use glade::data_structures::scene::Placement;
use glade::resources::{CpuMesh, CpuScene};

fn cpu_scene(positions: &[[f32; 3]]) -> CpuScene {
    let vertices = positions
        .iter()
        .map(|&position| ModelVertex {
            position,
            tex_coords: [0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
        })
        .collect();
    CpuScene {
        meshes: vec![CpuMesh {
            name: "fixture".to_string(),
            vertices,
            indices: vec![0, 1, 2],
            material: 0,
        }],
        materials: Vec::new(),
        clips: Vec::new(),
    }
}

// A lopsided triangle that floats below the ground plane.
fn sunken_fixture() -> CpuScene {
    cpu_scene(&[[-0.5, -0.3, 0.2], [0.4, 0.6, -0.1], [0.1, 1.2, 0.4]])
}

#[test]
fn should_rest_scaled_model_on_the_ground() {
    let scene = sunken_fixture();
    let placement = Placement::new(20.0, (0.0, 0.0), Deg(90.0));

    let transform = placement.resolve(&scene.bounds());
    let world = scene.bounds().transformed(&transform);

    assert!(
        world.min.y.abs() < 1e-4,
        "expected the subtree to touch y = 0, got {}",
        world.min.y
    );
    // scale 20 over a 1.5 unit tall fixture
    assert!((world.max.y - 30.0).abs() < 1e-3);
}

#[test]
fn should_rest_offset_model_on_the_ground() {
    let scene = sunken_fixture();
    let placement = Placement::new(10.0, (10.0, -10.0), Deg(0.0));

    let transform = placement.resolve(&scene.bounds());
    let world = scene.bounds().transformed(&transform);

    assert!(world.min.y.abs() < 1e-4);
    // The X/Z offsets shift the footprint but never the ground contact.
    assert!((transform.position.x - 10.0).abs() < f32::EPSILON);
    assert!((transform.position.z + 10.0).abs() < f32::EPSILON);
}

#[test]
fn should_keep_ground_contact_under_rotation() {
    let scene = sunken_fixture();
    for degrees in [0.0, 45.0, 90.0, 180.0, 270.0] {
        let placement = Placement::new(20.0, (0.0, 0.0), Deg(degrees));
        let world = scene
            .bounds()
            .transformed(&placement.resolve(&scene.bounds()));
        assert!(
            world.min.y.abs() < 1e-3,
            "rotation {} lifted the model to {}",
            degrees,
            world.min.y
        );
    }
}

#[test]
fn should_stage_models_independently_of_completion_order() {
    let model = sunken_fixture();
    let tree = cpu_scene(&[[-1.0, 0.1, -1.0], [1.0, 0.1, 1.0], [0.0, 2.0, 0.0]]);

    let model_placement = Placement::new(20.0, (0.0, 0.0), Deg(90.0));
    let tree_placement = Placement::new(10.0, (10.0, -10.0), Deg(0.0));

    // "model then tree"
    let first_model = model_placement.resolve(&model.bounds());
    let first_tree = tree_placement.resolve(&tree.bounds());
    // "tree then model"
    let second_tree = tree_placement.resolve(&tree.bounds());
    let second_model = model_placement.resolve(&model.bounds());

    assert_eq!(first_model.position, second_model.position);
    assert_eq!(first_tree.position, second_tree.position);

    for staged in [
        model.bounds().transformed(&first_model),
        tree.bounds().transformed(&first_tree),
    ] {
        assert!(staged.min.y.abs() < 1e-3);
    }
}

#[test]
fn should_not_lift_an_empty_subtree() {
    let empty = CpuScene {
        meshes: Vec::new(),
        materials: Vec::new(),
        clips: Vec::new(),
    };
    let placement = Placement::new(20.0, (0.0, 0.0), Deg(0.0));

    let transform = placement.resolve(&empty.bounds());

    assert!(transform.position.y == 0.0);
    assert!(transform.position.y.is_finite());
}
