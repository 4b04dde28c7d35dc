//! A `bevy_transition_cam` extension that lets any system move a camera to one of the standard
//! views by sending an event, without needing the camera's window or viewport.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_window::RequestRedraw;

use crate::{
    controller::{snapshot::ProjectionMode, TransitionCamSystems},
    prelude::*,
};

/// See the [module](self) docs.
pub struct LookToPlugin;

impl Plugin for LookToPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LookToTrigger>()
            .add_systems(
                PreUpdate,
                LookToTrigger::receive.in_set(TransitionCamSystems::Input),
            )
            .register_type::<LookToTrigger>();
    }
}

/// Send this event to move a camera to a standard view. Perspective views animate there;
/// orthographic views jump.
#[derive(Debug, Clone, Copy, PartialEq, Event, Reflect)]
pub struct LookToTrigger {
    /// The camera to move.
    pub camera: Entity,
    /// Which view to show.
    pub view: StandardView,
    /// Perspective or orthographic.
    pub projection: ProjectionMode,
}

impl LookToTrigger {
    /// Animate `camera` to the perspective version of `view`.
    pub fn perspective(camera: Entity, view: StandardView) -> Self {
        Self {
            camera,
            view,
            projection: ProjectionMode::Perspective,
        }
    }

    /// Jump `camera` to the orthographic version of `view`.
    pub fn orthographic(camera: Entity, view: StandardView) -> Self {
        Self {
            camera,
            view,
            projection: ProjectionMode::Orthographic,
        }
    }

    fn receive(
        mut events: EventReader<Self>,
        mut cameras: Query<(Option<&Camera>, &mut TransitionCam)>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        for event in events.read() {
            let Ok((camera, mut controller)) = cameras.get_mut(event.camera) else {
                continue;
            };
            match event.projection {
                ProjectionMode::Perspective => {
                    controller.perspective_view(event.view);
                }
                ProjectionMode::Orthographic => {
                    let Some(viewport) = camera.and_then(Camera::logical_viewport_size) else {
                        warn!(
                            "Cannot show the orthographic {:?} view on {}: no viewport size",
                            event.view, event.camera
                        );
                        continue;
                    };
                    controller.ortho_view(event.view, &viewport);
                }
            }
            redraw.write(RequestRedraw);
        }
    }
}
