//! Animation clips and the mixer.
//!
//! Clip data is parsed out of glTF containers (see `resources::load_scene_gltf`),
//! but the viewer never constructs a [`Mixer`] from a load result today: the
//! loop advances `Option<Mixer>` each frame and the option stays `None`. The
//! types below are the extension point for when a scene wants to drive one.

use cgmath::{InnerSpace, Quaternion, Vector3};
use instant::Duration;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
    Other,
}

/// An animation clip: a named track with keyframes and timing.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

impl AnimationClip {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Index of the keyframe at or before `time`, plus the blend factor
    /// toward the next one.
    fn bracket(&self, time: f32) -> Option<(usize, f32)> {
        if self.timestamps.is_empty() {
            return None;
        }
        let last = self.timestamps.len() - 1;
        let at = self
            .timestamps
            .iter()
            .rposition(|&t| t <= time)
            .unwrap_or(0);
        if at >= last {
            return Some((last, 0.0));
        }
        let t0 = self.timestamps[at];
        let t1 = self.timestamps[at + 1];
        let span = t1 - t0;
        let blend = if span > 0.0 { (time - t0) / span } else { 0.0 };
        Some((at, blend))
    }

    pub fn sample_translation(&self, time: f32) -> Option<Vector3<f32>> {
        let Keyframes::Translation(frames) = &self.keyframes else {
            return None;
        };
        let (at, blend) = self.bracket(time)?;
        let from = *frames.get(at)?;
        let to = *frames.get(at + 1).unwrap_or(&from);
        Some(from + (to - from) * blend)
    }

    pub fn sample_rotation(&self, time: f32) -> Option<Quaternion<f32>> {
        let Keyframes::Rotation(frames) = &self.keyframes else {
            return None;
        };
        let (at, blend) = self.bracket(time)?;
        let from = *frames.get(at)?;
        let to = *frames.get(at + 1).unwrap_or(&from);
        Some(from.slerp(to, blend).normalize())
    }
}

/// Advances a set of clips against wall-clock time, wrapping at the end of
/// the longest clip.
#[derive(Clone, Debug)]
pub struct Mixer {
    clips: Vec<AnimationClip>,
    time: f32,
}

impl Mixer {
    /// `None` when the model carries no animation at all.
    pub fn from_clips(clips: Vec<AnimationClip>) -> Option<Self> {
        if clips.is_empty() {
            None
        } else {
            Some(Self { clips, time: 0.0 })
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.clips
            .iter()
            .map(AnimationClip::duration)
            .fold(0.0, f32::max)
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.iter().find(|c| c.name == name)
    }

    pub fn update(&mut self, dt: Duration) {
        let duration = self.duration();
        if duration <= 0.0 {
            return;
        }
        self.time = (self.time + dt.as_secs_f32()) % duration;
    }
}
