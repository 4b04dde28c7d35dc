//! A `bevy_transition_cam` extension that draws an indicator in the scene at the orbit target
//! while the camera moves, so users can see what point the camera is turning around.

use bevy_app::prelude::*;
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::{prelude::*, Isometry3d};
use bevy_reflect::prelude::*;
use bevy_transform::{prelude::*, TransformSystem};

use crate::{controller::snapshot::ProjectionMode, prelude::*};

/// See the [module](self) docs.
pub struct TargetIndicatorPlugin;

impl Plugin for TargetIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            draw_target.after(TransformSystem::TransformPropagate),
        )
        .register_type::<TargetIndicator>();
    }
}

/// Optional. Configures whether or not a [`TransitionCam`] should show a target indicator while it
/// moves. The indicator will be enabled if this component is not present.
#[derive(Debug, Component, Reflect)]
pub struct TargetIndicator {
    /// Should the indicator be visible on this camera?
    pub enabled: bool,
}

impl Default for TargetIndicator {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Size of the indicator relative to the visible height at the target.
const INDICATOR_SCALE: f32 = 0.01;

/// Use gizmos to draw the orbit target in world space.
pub fn draw_target(
    cameras: Query<(
        &TransitionCam,
        Ref<Transform>,
        &GlobalTransform,
        Option<&TargetIndicator>,
    )>,
    mut gizmos: Gizmos,
) {
    for (cam, transform, cam_transform, _) in cameras
        .iter()
        .filter(|(.., indicator)| indicator.map(|i| i.enabled).unwrap_or(true))
    {
        if !transform.is_changed() || transform.is_added() {
            continue;
        }
        let visible_height = match cam.projection_mode() {
            ProjectionMode::Perspective => {
                cam.distance() * 2.0 * (cam.fov_deg().to_radians() / 2.0).tan()
            }
            ProjectionMode::Orthographic => cam.ortho_rect().height(),
        };
        let scale = visible_height as f32 * INDICATOR_SCALE;

        // Pulled toward the camera so surfaces through the target do not hide it
        let target = cam.target().as_vec3();
        let shift = (cam_transform.translation() - target).normalize_or_zero() * scale;
        let target = target + shift;

        let color = Color::WHITE;
        let arm_length = 0.4;
        let rotation = Quat::from_rotation_arc(Vec3::Z, *cam_transform.back());
        gizmos.circle(Isometry3d::new(target, rotation), scale, color);

        let offset = 1.5 * scale;
        for direction in [
            cam_transform.left(),
            cam_transform.right(),
            cam_transform.up(),
            cam_transform.down(),
        ] {
            gizmos.ray(
                target + direction * offset,
                direction * (offset * arm_length),
                color,
            );
        }
    }
}
