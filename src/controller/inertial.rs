//! Provides [`InertialParameter`], the clamped scalar every camera motion is built from.

use bevy_reflect::prelude::*;

/// Pending offsets smaller than this are dropped instead of integrated.
pub const OFFSET_EPSILON: f64 = 1e-3;

/// How a pending offset is folded into the value during a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub enum Integration {
    /// The whole offset is applied on the next update. No smoothing.
    #[default]
    Immediate,
    /// The offset decays geometrically at the camera's inertia coefficient. Each 60 fps frame
    /// applies `1 - inertia` of what is left, so the applied total converges on the offset.
    Decay,
}

/// A scalar with optional limits and an accumulated, not yet applied, offset.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct InertialParameter {
    value: f64,
    pending_offset: f64,
    lower_limit: Option<f64>,
    upper_limit: Option<f64>,
}

impl InertialParameter {
    /// An unbounded parameter.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            pending_offset: 0.0,
            lower_limit: None,
            upper_limit: None,
        }
    }

    /// A parameter bounded by the given limits. The initial value is clamped into them.
    pub fn with_limits(value: f64, lower_limit: Option<f64>, upper_limit: Option<f64>) -> Self {
        let mut param = Self {
            value,
            pending_offset: 0.0,
            lower_limit,
            upper_limit,
        };
        param.value = param.clamp(value);
        param
    }

    /// The current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The offset that will be integrated on the next update.
    pub fn pending_offset(&self) -> f64 {
        self.pending_offset
    }

    /// The lower limit, if any.
    pub fn lower_limit(&self) -> Option<f64> {
        self.lower_limit
    }

    /// The upper limit, if any.
    pub fn upper_limit(&self) -> Option<f64> {
        self.upper_limit
    }

    /// Replace both limits and clamp the current value into them.
    pub fn set_limits(&mut self, lower_limit: Option<f64>, upper_limit: Option<f64>) {
        self.lower_limit = lower_limit;
        self.upper_limit = upper_limit;
        self.value = self.clamp(self.value);
    }

    /// Is there motion waiting to be integrated?
    pub fn is_idle(&self) -> bool {
        self.pending_offset == 0.0
    }

    /// Accumulate `delta` into the pending offset.
    pub fn add_offset(&mut self, delta: f64) {
        self.pending_offset += delta;
    }

    /// Drop any pending offset.
    pub fn clear_offset(&mut self) {
        self.pending_offset = 0.0;
    }

    /// Jump to `value`, discarding any pending offset.
    pub fn set_immediate(&mut self, value: f64) {
        self.value = self.clamp(value);
        self.pending_offset = 0.0;
    }

    /// Overwrite the value but keep the pending offset. Used by animation playback, which owns the
    /// value for the duration of a transition while user input keeps accumulating.
    pub fn assign(&mut self, value: f64) {
        self.value = self.clamp(value);
    }

    /// Write the value back verbatim, limits included. Used for rollback.
    pub(crate) fn restore(&mut self, value: f64) {
        self.value = value;
    }

    /// Fold the pending offset into the value over `steps` 60 fps frames, then clamp.
    pub fn integrate(&mut self, steps: f64, integration: Integration, inertia: f64) {
        if self.pending_offset.abs() < OFFSET_EPSILON {
            self.pending_offset = 0.0;
            return;
        }
        match integration {
            Integration::Immediate => {
                self.value += self.pending_offset;
                self.pending_offset = 0.0;
            }
            Integration::Decay => {
                let remaining = inertia.powf(steps.max(0.0));
                self.value += self.pending_offset * (1.0 - remaining);
                self.pending_offset *= remaining;
            }
        }
        self.value = self.clamp(self.value);
    }

    fn clamp(&self, value: f64) -> f64 {
        let value = self.lower_limit.map_or(value, |lower| value.max(lower));
        self.upper_limit.map_or(value, |upper| value.min(upper))
    }
}
