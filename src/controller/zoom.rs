//! Provides [`DistanceLimits`] settings and the orthographic zoom rescale.

use bevy_reflect::Reflect;

use super::snapshot::OrthoRect;
use crate::error::{Result, SettingsError};

/// Bound how close to, and how far from, its target the camera may be.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DistanceLimits {
    /// The closest the camera may get to its target.
    pub min: f64,
    /// The furthest the camera may get from its target. `None` is unbounded.
    pub max: Option<f64>,
}

impl Default for DistanceLimits {
    fn default() -> Self {
        Self { min: 0.0, max: None }
    }
}

impl DistanceLimits {
    /// Limits between `min` and `max`.
    pub fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Reject ranges that cannot hold any distance.
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() {
            return Err(SettingsError::NonFinite("distance_limits.min"));
        }
        if self.min < 0.0 {
            return Err(SettingsError::NegativeMinDistance(self.min));
        }
        if let Some(max) = self.max {
            if max.is_nan() {
                return Err(SettingsError::NonFinite("distance_limits.max"));
            }
            if self.min > max {
                return Err(SettingsError::InvalidDistanceRange { min: self.min, max });
            }
        }
        Ok(())
    }

    /// Clamp `distance` into the limits.
    pub fn clamp(&self, distance: f64) -> f64 {
        let distance = distance.max(self.min);
        self.max.map_or(distance, |max| distance.min(max))
    }
}

/// Rescale an orthographic rectangle after the camera distance changed from `old_distance` to
/// `new_distance`, keeping its center where it is.
///
/// The extents scale with `(1 / old_distance) / (1 / new_distance)`, so doubling the distance
/// doubles the visible area along each axis. Returns `None` when either distance is not a usable
/// divisor.
pub fn rescale_ortho_rect(
    rect: OrthoRect,
    old_distance: f64,
    new_distance: f64,
) -> Option<OrthoRect> {
    let (old_inv, new_inv) = (old_distance.recip(), new_distance.recip());
    let ratio = old_inv / new_inv;
    if !ratio.is_finite() || ratio <= 0.0 {
        return None;
    }
    Some(OrthoRect::from_center_size(
        rect.center(),
        rect.width() * ratio,
        rect.height() * ratio,
    ))
}
