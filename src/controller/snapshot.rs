//! Immutable camera state: [`PoseSnapshot`] for comparisons and restores, and [`CameraPose`], the
//! derived view handed to the renderer.

use bevy_math::{prelude::*, DVec2, DVec3, EulerRot};
use bevy_reflect::prelude::*;
use bevy_render::camera::ScalingMode;
use bevy_render::prelude::*;
use bevy_transform::prelude::*;

/// Field of view values closer than this are considered equal.
pub const FOV_EPSILON_DEG: f64 = 1e-3;

/// Which projection the camera renders with. Exactly one is active at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ProjectionMode {
    /// Perspective projection, parameterized by field of view.
    #[default]
    Perspective,
    /// Orthographic projection, parameterized by an [`OrthoRect`].
    Orthographic,
}

/// The visible rectangle of an orthographic projection, in view space world units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct OrthoRect {
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl OrthoRect {
    /// A rectangle of the given size around `center`.
    pub fn from_center_size(center: DVec2, width: f64, height: f64) -> Self {
        Self {
            left: center.x - width / 2.0,
            right: center.x + width / 2.0,
            top: center.y + height / 2.0,
            bottom: center.y - height / 2.0,
        }
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.right + self.left) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

/// Direction the camera looks in for the given angles, in degrees.
///
/// Yaw turns about +Y, positive pitch tilts the view down toward the ground. At zero yaw and pitch
/// the camera looks down -Z, bevy's forward axis.
pub fn forward_from_yaw_pitch(yaw_deg: f64, pitch_deg: f64) -> DVec3 {
    let rotation = bevy_math::DQuat::from_euler(
        EulerRot::YXZ,
        yaw_deg.to_radians(),
        -pitch_deg.to_radians(),
        0.0,
    );
    rotation * DVec3::NEG_Z
}

/// Everything that defines a view, captured at one instant.
///
/// Equality is exact for every field except the field of view, which uses [`FOV_EPSILON_DEG`].
/// It decides whether a requested view change is a no-op and whether the derived [`CameraPose`] is
/// stale.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct PoseSnapshot {
    /// Active projection.
    pub projection_mode: ProjectionMode,
    /// Horizontal orbit angle.
    pub yaw_deg: f64,
    /// Vertical orbit angle.
    pub pitch_deg: f64,
    /// Distance from camera to target.
    pub distance: f64,
    /// The point the camera orbits and looks at.
    pub target: DVec3,
    /// Vertical field of view.
    pub fov_deg: f64,
    /// Orthographic bounds. Retained, but unused, while in perspective.
    pub ortho: OrthoRect,
}

impl PartialEq for PoseSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.projection_mode == other.projection_mode
            && self.yaw_deg == other.yaw_deg
            && self.pitch_deg == other.pitch_deg
            && self.distance == other.distance
            && self.target == other.target
            && (self.fov_deg - other.fov_deg).abs() <= FOV_EPSILON_DEG
            && self.ortho == other.ortho
    }
}

impl PoseSnapshot {
    /// The view direction implied by yaw and pitch.
    pub fn forward(&self) -> DVec3 {
        forward_from_yaw_pitch(self.yaw_deg, self.pitch_deg)
    }

    /// Camera position: `distance` back from the target, against the view direction.
    pub fn camera_position(&self) -> DVec3 {
        self.target - self.forward() * self.distance
    }

    /// Derive the renderable pose.
    pub fn pose(&self) -> CameraPose {
        let projection = match self.projection_mode {
            ProjectionMode::Perspective => ProjectionDescriptor::Perspective {
                fov_deg: self.fov_deg,
            },
            ProjectionMode::Orthographic => ProjectionDescriptor::Orthographic(self.ortho),
        };
        CameraPose {
            position: self.camera_position(),
            target: self.target,
            up: DVec3::Y,
            projection,
        }
    }
}

/// How the renderer should project the view.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum ProjectionDescriptor {
    /// Perspective with a vertical field of view.
    Perspective {
        /// Vertical field of view in degrees.
        fov_deg: f64,
    },
    /// Orthographic with an explicit visible rectangle.
    Orthographic(OrthoRect),
}

/// The camera placement a rendering collaborator consumes each frame.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CameraPose {
    /// Eye position.
    pub position: DVec3,
    /// Look-at point.
    pub target: DVec3,
    /// Up direction used to build the view.
    pub up: DVec3,
    /// Projection description.
    pub projection: ProjectionDescriptor,
}

impl CameraPose {
    /// A bevy [`Transform`] placing the camera at `position` looking at `target`.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position.as_vec3())
            .looking_at(self.target.as_vec3(), self.up.as_vec3())
    }

    /// Write this pose's projection into an existing bevy [`Projection`], switching variants if
    /// needed. Near and far planes of an existing projection of the same kind are kept.
    pub fn apply_projection(&self, projection: &mut Projection) {
        match (self.projection, projection) {
            (
                ProjectionDescriptor::Perspective { fov_deg },
                Projection::Perspective(perspective),
            ) => {
                perspective.fov = fov_deg.to_radians() as f32;
            }
            (ProjectionDescriptor::Perspective { fov_deg }, projection) => {
                *projection = Projection::Perspective(PerspectiveProjection {
                    fov: fov_deg.to_radians() as f32,
                    ..Default::default()
                });
            }
            (ProjectionDescriptor::Orthographic(rect), Projection::Orthographic(ortho)) => {
                write_ortho_rect(ortho, rect);
            }
            (ProjectionDescriptor::Orthographic(rect), projection) => {
                let mut ortho = OrthographicProjection::default_3d();
                write_ortho_rect(&mut ortho, rect);
                *projection = Projection::Orthographic(ortho);
            }
        }
    }
}

/// Express an off-center rectangle as a fixed scaling mode plus a shifted viewport origin.
fn write_ortho_rect(ortho: &mut OrthographicProjection, rect: OrthoRect) {
    let (width, height) = (rect.width(), rect.height());
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let center = rect.center();
    ortho.scale = 1.0;
    ortho.scaling_mode = ScalingMode::Fixed {
        width: width as f32,
        height: height as f32,
    };
    ortho.viewport_origin = Vec2::new(
        (0.5 - center.x / width) as f32,
        (0.5 - center.y / height) as f32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PoseSnapshot {
        PoseSnapshot {
            projection_mode: ProjectionMode::Perspective,
            yaw_deg: 30.0,
            pitch_deg: 10.0,
            distance: 10.0,
            target: DVec3::new(1.0, 2.0, 3.0),
            fov_deg: 15.0,
            ortho: OrthoRect::default(),
        }
    }

    #[test]
    fn fov_compares_with_tolerance() {
        let a = snapshot();
        let b = PoseSnapshot {
            fov_deg: a.fov_deg + FOV_EPSILON_DEG / 2.0,
            ..a
        };
        assert_eq!(a, b);

        let c = PoseSnapshot {
            fov_deg: a.fov_deg + 0.1,
            ..a
        };
        assert_ne!(a, c);
    }

    #[test]
    fn everything_else_compares_exactly() {
        let a = snapshot();
        assert_ne!(a, PoseSnapshot { yaw_deg: 30.0 + 1e-9, ..a });
        assert_ne!(a, PoseSnapshot { distance: 10.0 + 1e-9, ..a });
        assert_ne!(
            a,
            PoseSnapshot {
                target: DVec3::new(1.0, 2.0, 3.0 + 1e-9),
                ..a
            }
        );
        assert_ne!(
            a,
            PoseSnapshot {
                projection_mode: ProjectionMode::Orthographic,
                ..a
            }
        );
        assert_ne!(
            a,
            PoseSnapshot {
                ortho: OrthoRect::from_center_size(DVec2::ZERO, 2.0, 1.0),
                ..a
            }
        );
    }

    #[test]
    fn camera_sits_behind_target() {
        let front = PoseSnapshot {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            target: DVec3::ZERO,
            ..snapshot()
        };
        let position = front.camera_position();
        assert!((position - DVec3::new(0.0, 0.0, 10.0)).length() < 1e-9);

        let above = PoseSnapshot {
            pitch_deg: 89.9,
            ..front
        };
        assert!(above.camera_position().y > 9.99);
        assert!(above.forward().y < -0.99);
    }

    #[test]
    fn ortho_rect_geometry() {
        let rect = OrthoRect::from_center_size(DVec2::new(1.0, -2.0), 10.0, 6.0);
        assert_eq!(rect.left, -4.0);
        assert_eq!(rect.right, 6.0);
        assert_eq!(rect.top, 1.0);
        assert_eq!(rect.bottom, -5.0);
        assert_eq!(rect.width(), 10.0);
        assert_eq!(rect.height(), 6.0);
        assert_eq!(rect.center(), DVec2::new(1.0, -2.0));
    }

    #[test]
    fn pose_projection_follows_mode() {
        let perspective = snapshot().pose();
        assert_eq!(
            perspective.projection,
            ProjectionDescriptor::Perspective { fov_deg: 15.0 }
        );

        let rect = OrthoRect::from_center_size(DVec2::ZERO, 4.0, 2.0);
        let ortho = PoseSnapshot {
            projection_mode: ProjectionMode::Orthographic,
            ortho: rect,
            ..snapshot()
        }
        .pose();
        assert_eq!(ortho.projection, ProjectionDescriptor::Orthographic(rect));
    }

    #[test]
    fn projection_switches_variant() {
        let rect = OrthoRect::from_center_size(DVec2::new(1.0, 0.0), 4.0, 2.0);
        let pose = PoseSnapshot {
            projection_mode: ProjectionMode::Orthographic,
            ortho: rect,
            ..snapshot()
        }
        .pose();
        let mut projection = Projection::Perspective(PerspectiveProjection::default());
        pose.apply_projection(&mut projection);
        let Projection::Orthographic(ortho) = &projection else {
            panic!("expected an orthographic projection");
        };
        assert_eq!(ortho.viewport_origin, Vec2::new(0.25, 0.5));

        snapshot().pose().apply_projection(&mut projection);
        assert!(matches!(projection, Projection::Perspective(_)));
    }
}
