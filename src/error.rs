//! Errors reported when building a [`TransitionCam`](crate::controller::component::TransitionCam).

use thiserror::Error;

/// Settings that cannot produce a valid camera.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The minimum distance is larger than the maximum distance.
    #[error("minimum distance {min} exceeds maximum distance {max}")]
    InvalidDistanceRange {
        /// Requested minimum.
        min: f64,
        /// Requested maximum.
        max: f64,
    },

    /// Distances are measured from the target and cannot be negative.
    #[error("minimum distance must not be negative, got {0}")]
    NegativeMinDistance(f64),

    /// A numeric setting was NaN or infinite.
    #[error("setting `{0}` must be finite")]
    NonFinite(&'static str),

    /// Animated transitions need at least one frame and a positive frame rate.
    #[error("invalid transition timing: {frames} frames at {fps} fps")]
    InvalidTransition {
        /// Frames per transition.
        frames: u32,
        /// Frames per second.
        fps: f64,
    },
}

/// Result type for camera construction.
pub type Result<T> = std::result::Result<T, SettingsError>;
