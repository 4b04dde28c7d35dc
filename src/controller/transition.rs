//! Animated transitions between camera states.
//!
//! The [`TransitionDriver`] decides *what* to animate: one [`ParamTransition`] per camera scalar
//! that actually changes. Interpolating the value over time is left to an
//! [`AnimationPlayback`](super::collaborators::AnimationPlayback), which reports completion by id
//! so the driver can retire the entry.

use std::time::Duration;

use bevy_reflect::prelude::*;

use super::snapshot::PoseSnapshot;

/// Start and end values closer than this are not animated.
pub const TRANSITION_EPSILON: f64 = 1e-6;

/// The animatable camera scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ParamId {
    /// Horizontal orbit angle in degrees.
    Yaw,
    /// Vertical orbit angle in degrees.
    Pitch,
    /// Distance from camera to target.
    Distance,
    /// Target position, x component.
    TargetX,
    /// Target position, y component.
    TargetY,
    /// Target position, z component.
    TargetZ,
}

/// Identifies one issued transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct TransitionId(pub u64);

/// A single scalar animation: `start` to `end` over `frame_count` frames at `frame_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ParamTransition {
    /// Unique id, used to retire the transition when playback completes.
    pub id: TransitionId,
    /// The scalar being animated.
    pub param: ParamId,
    /// Value at frame 0.
    pub start: f64,
    /// Value at the last frame.
    pub end: f64,
    /// Length of the transition in frames.
    pub frame_count: u32,
    /// Frames per second.
    pub frame_rate: f64,
}

impl ParamTransition {
    /// Real time the transition lasts.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count as f64 / self.frame_rate)
    }

    /// Linear keyframe value at `frame`, clamped to the transition's range.
    pub fn value_at_frame(&self, frame: f64) -> f64 {
        let t = (frame / self.frame_count as f64).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * t
    }
}

/// Reduce both yaw angles modulo 360, then shift `start` by a full turn if that makes the rotation
/// shorter. Returns the adjusted `(start, end)` pair.
pub fn shortest_yaw_path(start_deg: f64, end_deg: f64) -> (f64, f64) {
    let mut start = start_deg.rem_euclid(360.0);
    let end = end_deg.rem_euclid(360.0);
    if (start - end).abs() > 180.0 {
        if start - end > 0.0 {
            start -= 360.0;
        } else {
            start += 360.0;
        }
    }
    (start, end)
}

/// Builds and tracks the camera's in-flight transitions.
///
/// Issuing a transition for a parameter that is already animating does not cancel the first one:
/// both stay active and playback applies them in issue order.
#[derive(Debug, Clone, Reflect)]
pub struct TransitionDriver {
    frame_count: u32,
    frame_rate: f64,
    active: Vec<ParamTransition>,
    /// Issued, but not yet handed to playback.
    unplayed: Vec<ParamTransition>,
    next_id: u64,
}

impl Default for TransitionDriver {
    fn default() -> Self {
        Self::new(60, 60.0)
    }
}

impl TransitionDriver {
    /// A driver issuing transitions of `frame_count` frames at `frame_rate` fps.
    pub fn new(frame_count: u32, frame_rate: f64) -> Self {
        Self {
            frame_count,
            frame_rate,
            active: Vec::new(),
            unplayed: Vec::new(),
            next_id: 0,
        }
    }

    /// Frames per transition.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Transition frame rate.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Transitions that have been issued and not yet retired.
    pub fn active(&self) -> &[ParamTransition] {
        &self.active
    }

    /// Is any transition still running?
    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    /// Issue a transition of `param` from `start` to `end`. Returns `None`, issuing nothing, if
    /// the two are within [`TRANSITION_EPSILON`].
    pub fn enqueue(&mut self, param: ParamId, start: f64, end: f64) -> Option<TransitionId> {
        if (start - end).abs() <= TRANSITION_EPSILON {
            return None;
        }
        let id = TransitionId(self.next_id);
        self.next_id += 1;
        let transition = ParamTransition {
            id,
            param,
            start,
            end,
            frame_count: self.frame_count,
            frame_rate: self.frame_rate,
        };
        self.active.push(transition);
        self.unplayed.push(transition);
        Some(id)
    }

    /// Issue a yaw transition that takes the shorter way around.
    pub fn enqueue_yaw(&mut self, start_deg: f64, end_deg: f64) -> Option<TransitionId> {
        let (start, end) = shortest_yaw_path(start_deg, end_deg);
        self.enqueue(ParamId::Yaw, start, end)
    }

    /// Issue transitions for every scalar that differs between `from` and `to`. Returns how many
    /// were issued.
    pub fn animate_between(&mut self, from: &PoseSnapshot, to: &PoseSnapshot) -> usize {
        [
            self.enqueue_yaw(from.yaw_deg, to.yaw_deg),
            self.enqueue(ParamId::Pitch, from.pitch_deg, to.pitch_deg),
            self.enqueue(ParamId::Distance, from.distance, to.distance),
            self.enqueue(ParamId::TargetX, from.target.x, to.target.x),
            self.enqueue(ParamId::TargetY, from.target.y, to.target.y),
            self.enqueue(ParamId::TargetZ, from.target.z, to.target.z),
        ]
        .iter()
        .flatten()
        .count()
    }

    /// Remove a completed transition from the active set. Returns `false` if it was unknown.
    pub fn retire(&mut self, id: TransitionId) -> bool {
        self.unplayed.retain(|t| t.id != id);
        let before = self.active.len();
        self.active.retain(|t| t.id != id);
        self.active.len() != before
    }

    /// Hand over the transitions issued since the last call, for playback.
    pub fn take_unplayed(&mut self) -> Vec<ParamTransition> {
        std::mem::take(&mut self.unplayed)
    }
}
