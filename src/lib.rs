//! An orbit camera controller for 3D viewers, with animated transitions between standard views.
//!
//! The camera is described by a yaw, pitch and distance around a target point. Mouse, wheel and
//! keyboard input accumulate small offsets that are integrated once per frame, while view changes
//! animate every parameter from where the camera is to where it should be. Orthographic standard
//! views are one keystroke away, and switching back restores the perspective view exactly as it
//! was.
//!
//! # Getting Started
//!
//! 1. Add the [`DefaultTransitionCamPlugins`] plugin group to your app.
//! 2. Add the [`TransitionCam`](crate::prelude::TransitionCam) component to a camera entity.
//!
//! ```no_run
//! use bevy_ecs::prelude::*;
//! use bevy_transition_cam::prelude::*;
//!
//! fn setup(mut commands: Commands) {
//!     let settings = TransitionCamSettings::default().with_floor();
//!     if let Ok(cam) = TransitionCam::new(settings) {
//!         commands.spawn(cam);
//!     }
//! }
//! ```
//!
//! The component needs a `Camera`, `Transform` and `Projection` on the same entity, which bevy's
//! `Camera3d` provides.
//!
//! # Without bevy's schedule
//!
//! Everything the controller needs from the outside world is passed in through small traits in
//! [`controller::collaborators`]: a [`Clock`](controller::collaborators::Clock), a
//! [`Viewport`](controller::collaborators::Viewport), a
//! [`RayPick`](controller::collaborators::RayPick), an
//! [`AnimationPlayback`](controller::collaborators::AnimationPlayback) and a
//! [`DisplayMode`](controller::collaborators::DisplayMode). A host that drives the camera itself
//! can call the [`TransitionCam`](crate::prelude::TransitionCam) methods directly and read back a
//! [`CameraPose`](controller::snapshot::CameraPose) each frame.

pub mod controller;
pub mod error;
pub mod extensions;
pub mod input;

use bevy_app::{prelude::*, PluginGroupBuilder};

/// Adds all the plugins needed for a working camera: the controller, the default input mappings,
/// and the extensions enabled through cargo features.
pub struct DefaultTransitionCamPlugins;

impl PluginGroup for DefaultTransitionCamPlugins {
    #[allow(clippy::let_and_return)]
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>()
            .add(controller::TransitionCamPlugin)
            .add(input::TransitionCamInputPlugin)
            .add(extensions::look_to::LookToPlugin);

        #[cfg(feature = "extension_target_indicator")]
        let group = group.add(extensions::target_indicator::TargetIndicatorPlugin);

        group
    }
}

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            component::{StandardView, TransitionCam, TransitionCamSettings},
            playback::TransitionPlayback,
            snapshot::ProjectionMode,
            zoom::DistanceLimits,
        },
        error::SettingsError,
        extensions::look_to::LookToTrigger,
        DefaultTransitionCamPlugins,
    };
}
