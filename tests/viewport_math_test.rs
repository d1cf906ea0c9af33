use cgmath::{Deg, Point3};
use instant::Duration;

use glade::camera::{Camera, OrbitController, Projection};
use glade::viewer::{clamped_scale_factor, surface_size};

#[test]
fn should_track_viewport_aspect_exactly() {
    let mut projection = Projection::new(800, 600, Deg(50.0), 0.1, 100.0);
    assert_eq!(projection.aspect, 800.0 / 600.0);

    projection.resize(1024, 768);
    assert_eq!(projection.aspect, 1024.0 / 768.0);

    projection.resize(333, 777);
    assert_eq!(projection.aspect, 333.0 / 777.0);
}

#[test]
fn should_ignore_degenerate_resize() {
    let mut projection = Projection::new(800, 600, Deg(50.0), 0.1, 100.0);
    projection.resize(0, 600);
    assert_eq!(projection.aspect, 800.0 / 600.0);
}

#[test]
fn should_clamp_pixel_ratio_to_two() {
    let cases = [(1.0, 1.0), (1.5, 1.5), (2.0, 2.0), (3.0, 2.0)];
    for (ratio, expected) in cases {
        assert_eq!(clamped_scale_factor(ratio), expected);
    }
}

#[test]
fn should_downscale_surface_only_beyond_the_clamp() {
    // Up to a ratio of 2 the surface matches the physical size.
    assert_eq!(surface_size((800, 600), 1.0), (800, 600));
    assert_eq!(surface_size((1200, 900), 1.5), (1200, 900));
    assert_eq!(surface_size((1600, 1200), 2.0), (1600, 1200));
    // A 3x display renders at 2/3 of its physical size.
    assert_eq!(surface_size((3000, 1500), 3.0), (2000, 1000));
}

fn demo_camera() -> (Camera, OrbitController) {
    let camera = Camera::new((-20.0, 30.0, 50.0), (0.0, 0.0, 0.0));
    let controller = OrbitController::new(camera.position, camera.target);
    (camera, controller)
}

#[test]
fn should_derive_orbit_state_from_the_camera_position() {
    let (_, controller) = demo_camera();
    let expected_radius = (20.0f32 * 20.0 + 30.0 * 30.0 + 50.0 * 50.0).sqrt();
    assert!((controller.radius() - expected_radius).abs() < 1e-3);
}

#[test]
fn should_stay_put_without_input() {
    let (mut camera, mut controller) = demo_camera();
    let initial = camera.position;
    for _ in 0..10 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    let drift: Point3<f32> = camera.position;
    assert!((drift.x - initial.x).abs() < 1e-2);
    assert!((drift.y - initial.y).abs() < 1e-2);
    assert!((drift.z - initial.z).abs() < 1e-2);
}

#[test]
fn should_damp_drag_input_over_several_frames() {
    let (mut camera, mut controller) = demo_camera();
    let initial_yaw = controller.yaw();

    controller.begin_drag();
    controller.handle_mouse(120.0, 0.0);
    controller.end_drag();

    controller.update(&mut camera, Duration::from_millis(16));
    let after_one = controller.yaw();
    // One frame consumes part of the pending rotation, not all of it.
    assert!(after_one != initial_yaw);
    assert!((after_one - initial_yaw).abs() < (120.0 * 0.005));

    for _ in 0..400 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    // The pending input has fully bled into the orbit.
    assert!((controller.yaw() - (initial_yaw + 120.0 * 0.005)).abs() < 1e-3);
}

#[test]
fn should_ignore_motion_when_not_dragging() {
    let (mut camera, mut controller) = demo_camera();
    let initial_yaw = controller.yaw();

    controller.handle_mouse(500.0, 250.0);
    for _ in 0..20 {
        controller.update(&mut camera, Duration::from_millis(16));
    }

    assert_eq!(controller.yaw(), initial_yaw);
}

#[test]
fn should_zoom_toward_the_target_and_clamp() {
    let (mut camera, mut controller) = demo_camera();
    let initial_radius = controller.radius();

    controller.handle_scroll(3.0);
    for _ in 0..400 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    assert!(controller.radius() < initial_radius);

    // A huge zoom-out saturates at the far clamp instead of escaping.
    controller.handle_scroll(-10_000.0);
    for _ in 0..400 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    assert!(controller.radius() <= 95.0 + 1e-3);
}

#[test]
fn should_clamp_pitch_short_of_the_poles() {
    let (mut camera, mut controller) = demo_camera();

    controller.begin_drag();
    controller.handle_mouse(0.0, 100_000.0);
    controller.end_drag();
    for _ in 0..400 {
        controller.update(&mut camera, Duration::from_millis(16));
    }

    assert!(controller.pitch().abs() < std::f32::consts::FRAC_PI_2);
}
