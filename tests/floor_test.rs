use glade::data_structures::scene::{Aabb, floor_transform};
use glade::resources::mesh::box_mesh;

const FLOOR_DIMENSIONS: [f32; 3] = [50.0, 1.0, 50.0];

fn bounds_of(vertices: &[glade::data_structures::model::ModelVertex]) -> Aabb {
    let mut bounds = Aabb::empty();
    for v in vertices {
        bounds.include(v.position.into());
    }
    bounds
}

#[test]
fn should_build_a_closed_box() {
    let (vertices, indices) = box_mesh(FLOOR_DIMENSIONS);
    // four vertices per face keep the normals hard
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));

    for v in &vertices {
        let n = v.normal;
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-6, "non-unit normal {:?}", n);
        assert!(v.tex_coords[0] >= 0.0 && v.tex_coords[0] <= 1.0);
        assert!(v.tex_coords[1] >= 0.0 && v.tex_coords[1] <= 1.0);
    }
}

#[test]
fn should_centre_the_box_on_the_origin() {
    let (vertices, _) = box_mesh(FLOOR_DIMENSIONS);
    let bounds = bounds_of(&vertices);
    assert_eq!(bounds.min.x, -25.0);
    assert_eq!(bounds.max.x, 25.0);
    assert_eq!(bounds.min.y, -0.5);
    assert_eq!(bounds.max.y, 0.5);
    assert_eq!(bounds.min.z, -25.0);
    assert_eq!(bounds.max.z, 25.0);
}

#[test]
fn should_park_the_floor_top_face_at_ground_level() {
    let transform = floor_transform(FLOOR_DIMENSIONS);
    assert_eq!(transform.position.y, -0.5);

    let (vertices, _) = box_mesh(FLOOR_DIMENSIONS);
    let world = bounds_of(&vertices).transformed(&transform);
    // The top face sits exactly at y = 0, whatever the load timing of the
    // floor texture.
    assert_eq!(world.max.y, 0.0);
    assert_eq!(world.min.y, -1.0);
}

#[test]
fn should_keep_ground_level_for_other_slab_sizes() {
    for dims in [[10.0, 0.25, 10.0], [80.0, 2.0, 30.0]] {
        let (vertices, _) = box_mesh(dims);
        let world = bounds_of(&vertices).transformed(&floor_transform(dims));
        assert!(world.max.y.abs() < 1e-6);
    }
}
