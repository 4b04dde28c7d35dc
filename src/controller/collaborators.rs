//! The services a [`TransitionCam`](super::component::TransitionCam) consumes but does not own,
//! and their bevy implementations.
//!
//! Collaborators are passed to the operations that need them. The controller never reaches for a
//! global window, clock, or scene.

use std::time::Duration;

use bevy_ecs::entity::Entity;
use bevy_math::{prelude::*, DVec3};
use bevy_picking::{hover::HoverMap, pointer::PointerId};
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;
use bevy_window::{MonitorSelection, Window, WindowMode};

use super::transition::{ParamId, ParamTransition, TransitionId};

/// A monotonic time source.
pub trait Clock {
    /// Time since some fixed origin.
    fn now(&self) -> Duration;
}

impl Clock for Time {
    fn now(&self) -> Duration {
        self.elapsed()
    }
}

/// A fixed instant. Handy for hosts that track time themselves.
impl Clock for Duration {
    fn now(&self) -> Duration {
        *self
    }
}

/// Reports the size of the surface being rendered to.
pub trait Viewport {
    /// Logical size in pixels.
    fn size(&self) -> Vec2;

    /// Width over height. Falls back to 1 for an empty viewport.
    fn aspect_ratio(&self) -> f64 {
        let size = self.size();
        if size.y > 0.0 {
            (size.x / size.y) as f64
        } else {
            1.0
        }
    }
}

impl Viewport for Window {
    fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }
}

impl Viewport for Vec2 {
    fn size(&self) -> Vec2 {
        *self
    }
}

/// What a ray cast from the screen hit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct PickResult {
    /// World space hit position.
    pub hit_point: Option<DVec3>,
    /// The entity that was hit.
    pub hit_object: Option<Entity>,
}

/// Turns screen coordinates into a world space hit.
pub trait RayPick {
    /// Cast a ray through `screen` (logical pixels, origin top left).
    fn pick(&self, screen: Vec2) -> PickResult;
}

/// [`RayPick`] over the hover state computed by `bevy_picking` backends.
///
/// Backends have already cast through the mouse cursor this frame, so the nearest mouse hit seen
/// by `camera` is returned. The screen position must be the cursor position.
pub struct HoverPick<'a> {
    /// Hover state of all pointers.
    pub hover_map: &'a HoverMap,
    /// Only hits reported for this camera are used.
    pub camera: Entity,
}

impl RayPick for HoverPick<'_> {
    fn pick(&self, _screen: Vec2) -> PickResult {
        let Some(hits) = self.hover_map.get(&PointerId::Mouse) else {
            return PickResult::default();
        };
        hits.iter()
            .filter(|(_, hit)| hit.camera == self.camera)
            .min_by(|(_, a), (_, b)| a.depth.total_cmp(&b.depth))
            .map(|(entity, hit)| PickResult {
                hit_point: hit.position.map(|p| p.as_dvec3()),
                hit_object: Some(*entity),
            })
            .unwrap_or_default()
    }
}

/// One interpolated value produced by an [`AnimationPlayback`].
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PlaybackSample {
    /// Which transition produced this value.
    pub id: TransitionId,
    /// The camera parameter it drives.
    pub param: ParamId,
    /// Interpolated value for this frame.
    pub value: f64,
    /// This is the last sample; the transition has reached its end value.
    pub finished: bool,
}

/// Plays scalar transitions from a start to an end value over a number of frames.
pub trait AnimationPlayback {
    /// Start playing `transition`.
    fn play(&mut self, transition: ParamTransition);

    /// Advance all playing transitions by `delta`, returning the current value of each.
    fn advance(&mut self, delta: Duration) -> Vec<PlaybackSample>;
}

/// Switches the display between windowed and fullscreen.
pub trait DisplayMode {
    /// Toggle fullscreen. Returns whether the request was handled.
    fn toggle_fullscreen(&mut self) -> bool;
}

impl DisplayMode for Window {
    fn toggle_fullscreen(&mut self) -> bool {
        self.mode = match self.mode {
            WindowMode::Windowed => WindowMode::BorderlessFullscreen(MonitorSelection::Current),
            _ => WindowMode::Windowed,
        };
        true
    }
}
