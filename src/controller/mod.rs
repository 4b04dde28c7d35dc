//! Camera controller implementation.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_render::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use self::{component::FrameOutcome, playback::TransitionPlayback};
use crate::prelude::*;

pub mod collaborators;
pub mod component;
pub mod inertial;
pub mod playback;
pub mod snapshot;
pub mod transition;
pub mod zoom;

/// Adds [`TransitionCam`] integration, animation, and transform syncing.
pub struct TransitionCamPlugin;

impl Plugin for TransitionCamPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            PreUpdate,
            (
                TransitionCamSystems::Input,
                TransitionCamSystems::Animate,
                TransitionCamSystems::Integrate,
                TransitionCamSystems::Sync,
            )
                .chain(),
        )
        .add_systems(
            PreUpdate,
            (
                drive_playback.in_set(TransitionCamSystems::Animate),
                integrate_motion.in_set(TransitionCamSystems::Integrate),
                sync_camera.in_set(TransitionCamSystems::Sync),
            ),
        )
        .register_type::<TransitionCam>()
        .register_type::<TransitionPlayback>()
        .register_type::<TransitionCamSettings>()
        .register_type::<StandardView>()
        .register_type::<DistanceLimits>()
        .register_type::<snapshot::PoseSnapshot>()
        .register_type::<snapshot::CameraPose>()
        .register_type::<transition::ParamTransition>();
    }
}

/// Ordering of the controller's systems within [`PreUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum TransitionCamSystems {
    /// Input adapters send commands.
    Input,
    /// Transitions are handed to playback and animated values written back.
    Animate,
    /// Pending motion is integrated, with floor rollback.
    Integrate,
    /// The pose is written to [`Transform`] and [`Projection`].
    Sync,
}

/// Advance each camera's [`TransitionPlayback`] by the frame time.
pub fn drive_playback(
    mut cameras: Query<(&mut TransitionCam, &mut TransitionPlayback)>,
    time: Res<Time>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    for (mut cam, mut playback) in &mut cameras {
        if !cam.is_animating() && !playback.is_playing() {
            continue;
        }
        if cam.drive_playback(&mut *playback, time.delta()) {
            redraw.write(RequestRedraw);
        }
    }
}

/// Integrate pending motion on every camera. Called once per frame.
pub fn integrate_motion(
    mut cameras: Query<(Entity, &mut TransitionCam)>,
    time: Res<Time>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    for (entity, mut cam) in &mut cameras {
        match cam.update(&*time) {
            FrameOutcome::Idle => {}
            FrameOutcome::Integrated => {
                redraw.write(RequestRedraw);
            }
            FrameOutcome::RolledBack => {
                trace!("Camera {entity} stayed above the ground");
                redraw.write(RequestRedraw);
            }
        }
    }
}

/// Write the pose of each camera whose state changed into its [`Transform`] and [`Projection`].
pub fn sync_camera(mut cameras: Query<(Mut<TransitionCam>, Mut<Transform>, Mut<Projection>)>) {
    for (mut cam, mut transform, mut projection) in &mut cameras {
        let added = cam.is_added();
        let cam = cam.bypass_change_detection();
        if !cam.refresh_pose() && !added {
            continue;
        }
        let pose = *cam.cached_pose();
        *transform = pose.transform();
        if let Projection::Custom(_) = *projection {
            error_once!("Custom projections are not supported.");
            continue;
        }
        pose.apply_projection(&mut projection);
    }
}
