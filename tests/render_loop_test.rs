use instant::Duration;

use glade::resources::animation::{AnimationClip, Keyframes, Mixer};
use glade::viewer::FrameTimer;

#[test]
fn should_compute_strict_frame_deltas() {
    let mut timer = FrameTimer::new();

    let t0 = Duration::from_millis(16);
    let t1 = Duration::from_millis(49);
    let t2 = Duration::from_millis(50);

    assert_eq!(timer.advance(t0), Duration::from_millis(16));
    assert_eq!(timer.advance(t1), Duration::from_millis(33));
    assert_eq!(timer.advance(t2), Duration::from_millis(1));
}

#[test]
fn should_never_produce_a_negative_delta() {
    let mut timer = FrameTimer::new();

    timer.advance(Duration::from_millis(100));
    // A timestamp in the past collapses to a zero-length frame.
    let dt = timer.advance(Duration::from_millis(40));
    assert_eq!(dt, Duration::ZERO);
    // And timing resumes from the most recent timestamp.
    assert_eq!(timer.advance(Duration::from_millis(56)), Duration::from_millis(16));
}

#[test]
fn should_not_build_a_mixer_without_clips() {
    // The render loop's mixer branch stays inert for the current asset set.
    assert!(Mixer::from_clips(Vec::new()).is_none());
}

fn walk_clip() -> AnimationClip {
    AnimationClip {
        name: "walk".to_string(),
        keyframes: Keyframes::Translation(vec![
            [0.0, 0.0, 0.0].into(),
            [2.0, 0.0, 0.0].into(),
            [2.0, 0.0, 4.0].into(),
        ]),
        timestamps: vec![0.0, 1.0, 2.0],
    }
}

#[test]
fn should_advance_and_wrap_mixer_time() {
    let mut mixer = Mixer::from_clips(vec![walk_clip()]).unwrap();
    assert_eq!(mixer.duration(), 2.0);

    mixer.update(Duration::from_millis(1500));
    assert!((mixer.time() - 1.5).abs() < 1e-6);

    mixer.update(Duration::from_millis(1000));
    // 2.5 seconds into a 2 second clip wraps around to 0.5.
    assert!((mixer.time() - 0.5).abs() < 1e-6);
}

#[test]
fn should_interpolate_between_keyframes() {
    let clip = walk_clip();

    let mid = clip.sample_translation(0.5).unwrap();
    assert!((mid.x - 1.0).abs() < 1e-6);

    let late = clip.sample_translation(1.5).unwrap();
    assert!((late.x - 2.0).abs() < 1e-6);
    assert!((late.z - 2.0).abs() < 1e-6);

    // Past the end the last keyframe holds.
    let end = clip.sample_translation(10.0).unwrap();
    assert!((end.z - 4.0).abs() < 1e-6);
}

#[test]
fn should_tolerate_empty_clip_timestamps() {
    let clip = AnimationClip {
        name: "broken".to_string(),
        keyframes: Keyframes::Other,
        timestamps: Vec::new(),
    };
    assert_eq!(clip.duration(), 0.0);
    assert!(clip.sample_translation(0.5).is_none());

    let mut mixer = Mixer::from_clips(vec![clip]).unwrap();
    mixer.update(Duration::from_millis(16));
    assert_eq!(mixer.time(), 0.0);
}
