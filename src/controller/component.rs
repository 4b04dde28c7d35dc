//! The primary [`Component`] of the controller, [`TransitionCam`].

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};
use bevy_reflect::prelude::*;

use super::{
    collaborators::{AnimationPlayback, Clock, DisplayMode, PlaybackSample, RayPick, Viewport},
    inertial::{InertialParameter, Integration},
    playback::TransitionPlayback,
    snapshot::{CameraPose, OrthoRect, PoseSnapshot, ProjectionMode},
    transition::{ParamId, TransitionDriver},
    zoom::{rescale_ortho_rect, DistanceLimits},
};
use crate::error::{Result, SettingsError};

/// Pitch is kept this far from straight up or down, in degrees.
pub const PITCH_LIMIT_DEG: f64 = 89.9;
/// Degrees of orbit per unit of tumble input, before sensitivity.
pub const TUMBLE_DEG_PER_UNIT: f64 = 0.057;
/// Fraction of the target distance panned per viewport height of track input.
pub const TRACK_SCALE: f64 = 0.1;
/// Ground level to use when a floor is wanted but no particular height is.
pub const DEFAULT_GROUND_LEVEL: f64 = -100.0;
/// The camera itself must stay this far above the ground.
pub const CAMERA_FLOOR_CLEARANCE: f64 = 1.0;
/// Dolly factor large enough to reach any distance limit.
pub const DOLLY_TO_LIMIT: f64 = 9_999_999.0;
/// Integration is normalized to this frame duration.
const BASELINE_FRAME_SECS: f64 = 1.0 / 60.0;

/// The six canonical viewing directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum StandardView {
    /// Looking along +X from the left side.
    Left,
    /// Looking along -X from the right side.
    Right,
    /// Looking at the front.
    Front,
    /// Looking at the back.
    Back,
    /// Looking down from above.
    Top,
    /// Looking up from below.
    Bottom,
}

impl StandardView {
    /// All six views.
    pub const ALL: [StandardView; 6] = [
        StandardView::Left,
        StandardView::Right,
        StandardView::Front,
        StandardView::Back,
        StandardView::Top,
        StandardView::Bottom,
    ];

    /// `(yaw, pitch)` in degrees for the perspective version of this view. Side views look
    /// slightly down, and the top view stops short of vertical to avoid z-fighting on floors.
    pub fn perspective_angles(self) -> (f64, f64) {
        match self {
            StandardView::Left => (90.0, 5.0),
            StandardView::Right => (270.0, 5.0),
            StandardView::Front => (0.0, 5.0),
            StandardView::Back => (180.0, 5.0),
            StandardView::Top => (0.0, 87.5),
            StandardView::Bottom => (180.0, -89.5),
        }
    }

    /// `(yaw, pitch)` in degrees for the orthographic version of this view.
    pub fn ortho_angles(self) -> (f64, f64) {
        match self {
            StandardView::Left => (90.0, 0.0),
            StandardView::Right => (270.0, 0.0),
            StandardView::Front => (0.0, 0.0),
            StandardView::Back => (180.0, 0.0),
            StandardView::Top => (0.0, PITCH_LIMIT_DEG),
            StandardView::Bottom => (180.0, -PITCH_LIMIT_DEG),
        }
    }
}

/// Construction time settings of a [`TransitionCam`].
#[derive(Debug, Clone, Reflect)]
pub struct TransitionCamSettings {
    /// Initial horizontal orbit angle, degrees.
    pub yaw_deg: f64,
    /// Initial vertical orbit angle, degrees. Clamped to +/-[`PITCH_LIMIT_DEG`].
    pub pitch_deg: f64,
    /// Initial distance from the target. Clamped to `distance_limits`.
    pub distance: f64,
    /// Initial orbit target.
    pub target: DVec3,
    /// Vertical field of view, degrees.
    pub fov_deg: f64,
    /// Near and far distance bounds.
    pub distance_limits: DistanceLimits,
    /// Inertia coefficient used by [`Integration::Decay`].
    pub inertia: f64,
    /// How pending motion is applied each frame.
    pub integration: Integration,
    /// Neither the target nor the camera may go below this height. `None` disables the floor.
    pub ground_level: Option<f64>,
    /// Multiplier on tumble input.
    pub tumble_sensitivity: f64,
    /// Multiplier on track input.
    pub track_sensitivity: f64,
    /// Divisor applied to pixel based wheel input by the input adapters.
    pub wheel_precision: f64,
    /// Frames per animated transition.
    pub transition_frames: u32,
    /// Frame rate of animated transitions.
    pub transition_fps: f64,
}

impl Default for TransitionCamSettings {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: 5.0,
            distance: 10.0,
            target: DVec3::ZERO,
            fov_deg: 15.0,
            distance_limits: DistanceLimits::default(),
            inertia: 0.6,
            integration: Integration::Immediate,
            ground_level: None,
            tumble_sensitivity: 1.0,
            track_sensitivity: 1.0,
            wheel_precision: 3.0,
            transition_frames: 60,
            transition_fps: 60.0,
        }
    }
}

impl TransitionCamSettings {
    /// Set the initial orbit angles.
    pub fn with_angles(self, yaw_deg: f64, pitch_deg: f64) -> Self {
        Self {
            yaw_deg,
            pitch_deg,
            ..self
        }
    }

    /// Set the initial target and distance.
    pub fn with_orbit(self, target: DVec3, distance: f64) -> Self {
        Self {
            target,
            distance,
            ..self
        }
    }

    /// Set the distance bounds.
    pub fn with_distance_limits(self, min: f64, max: Option<f64>) -> Self {
        Self {
            distance_limits: DistanceLimits::new(min, max),
            ..self
        }
    }

    /// Keep the camera and target above [`DEFAULT_GROUND_LEVEL`].
    pub fn with_floor(self) -> Self {
        self.with_ground_level(DEFAULT_GROUND_LEVEL)
    }

    /// Keep the camera and target above `ground_level`.
    pub fn with_ground_level(self, ground_level: f64) -> Self {
        Self {
            ground_level: Some(ground_level),
            ..self
        }
    }

    /// Smooth motion with [`Integration::Decay`] at the given inertia.
    pub fn with_inertia(self, inertia: f64) -> Self {
        Self {
            inertia,
            integration: Integration::Decay,
            ..self
        }
    }

    fn validate(&self) -> Result<()> {
        let finite = [
            ("yaw_deg", self.yaw_deg),
            ("pitch_deg", self.pitch_deg),
            ("distance", self.distance),
            ("target.x", self.target.x),
            ("target.y", self.target.y),
            ("target.z", self.target.z),
            ("fov_deg", self.fov_deg),
            ("inertia", self.inertia),
            ("tumble_sensitivity", self.tumble_sensitivity),
            ("track_sensitivity", self.track_sensitivity),
            ("wheel_precision", self.wheel_precision),
            ("ground_level", self.ground_level.unwrap_or_default()),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SettingsError::NonFinite(name));
        }
        self.distance_limits.validate()?;
        if self.transition_frames == 0
            || !self.transition_fps.is_finite()
            || self.transition_fps <= 0.0
        {
            return Err(SettingsError::InvalidTransition {
                frames: self.transition_frames,
                fps: self.transition_fps,
            });
        }
        Ok(())
    }
}

/// What a call to [`TransitionCam::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing was pending.
    Idle,
    /// Pending motion was applied.
    Integrated,
    /// Pending motion would have put the camera or target below the ground and was discarded.
    RolledBack,
}

/// An orbit camera that moves between views with animated transitions.
///
/// The camera is described by yaw, pitch and distance around a target point. Commands either
/// accumulate offsets that [`TransitionCam::update`] integrates once per frame, or jump straight to
/// a new [`PoseSnapshot`], or issue animated transitions that an [`AnimationPlayback`] feeds back.
///
/// # Moving the Camera
///
/// The [`TransitionCamInputPlugin`](crate::input::TransitionCamInputPlugin) translates mouse and
/// keyboard input into commands. To move the camera manually:
///
/// - [`TransitionCam::tumble`], [`TransitionCam::track`] and [`TransitionCam::dolly`] orbit, pan
///   and zoom.
/// - [`TransitionCam::perspective_view`] animates to a standard view, and
///   [`TransitionCam::ortho_view`] jumps to its orthographic version.
/// - [`TransitionCam::pick_target`] and [`TransitionCam::move_camera`] animate to a new target.
///
/// Commands issued from several systems in one frame are fine: offsets add up, and the last jump
/// wins.
#[derive(Debug, Clone, Reflect, Component)]
#[require(TransitionPlayback)]
pub struct TransitionCam {
    /// Multiplier on tumble input.
    pub tumble_sensitivity: f64,
    /// Multiplier on track input.
    pub track_sensitivity: f64,
    /// Divisor applied to pixel based wheel input by the input adapters.
    pub wheel_precision: f64,
    /// Inertia coefficient used by [`Integration::Decay`].
    pub inertia: f64,
    /// How pending motion is applied each frame.
    pub integration: Integration,
    fov_deg: f64,
    ground_level: Option<f64>,
    distance_limits: DistanceLimits,
    yaw: InertialParameter,
    pitch: InertialParameter,
    distance: InertialParameter,
    target_x: InertialParameter,
    target_y: InertialParameter,
    target_z: InertialParameter,
    projection_mode: ProjectionMode,
    ortho: OrthoRect,
    remembered_perspective: Option<PoseSnapshot>,
    transitions: TransitionDriver,
    last_update: Option<Duration>,
    cached: Option<PoseSnapshot>,
    pose: CameraPose,
}

impl Default for TransitionCam {
    fn default() -> Self {
        Self::build(TransitionCamSettings::default())
    }
}

impl TransitionCam {
    /// Create a camera from validated settings.
    pub fn new(settings: TransitionCamSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: TransitionCamSettings) -> Self {
        let limits = settings.distance_limits;
        let target_y = match settings.ground_level {
            Some(ground) => settings.target.y.max(ground),
            None => settings.target.y,
        };
        let mut cam = Self {
            tumble_sensitivity: settings.tumble_sensitivity,
            track_sensitivity: settings.track_sensitivity,
            wheel_precision: settings.wheel_precision,
            inertia: settings.inertia,
            integration: settings.integration,
            fov_deg: settings.fov_deg,
            ground_level: settings.ground_level,
            distance_limits: limits,
            yaw: InertialParameter::new(settings.yaw_deg),
            pitch: InertialParameter::with_limits(
                settings.pitch_deg,
                Some(-PITCH_LIMIT_DEG),
                Some(PITCH_LIMIT_DEG),
            ),
            distance: InertialParameter::with_limits(
                settings.distance,
                Some(limits.min),
                limits.max,
            ),
            target_x: InertialParameter::new(settings.target.x),
            target_y: InertialParameter::new(target_y),
            target_z: InertialParameter::new(settings.target.z),
            projection_mode: ProjectionMode::Perspective,
            ortho: OrthoRect::default(),
            remembered_perspective: None,
            transitions: TransitionDriver::new(
                settings.transition_frames,
                settings.transition_fps,
            ),
            last_update: None,
            cached: None,
            pose: CameraPose {
                position: DVec3::ZERO,
                target: DVec3::ZERO,
                up: DVec3::Y,
                projection: super::snapshot::ProjectionDescriptor::Perspective {
                    fov_deg: settings.fov_deg,
                },
            },
        };
        cam.refresh_pose();
        cam
    }

    /// Horizontal orbit angle, degrees.
    pub fn yaw_deg(&self) -> f64 {
        self.yaw.value()
    }

    /// Vertical orbit angle, degrees.
    pub fn pitch_deg(&self) -> f64 {
        self.pitch.value()
    }

    /// Distance from camera to target.
    pub fn distance(&self) -> f64 {
        self.distance.value()
    }

    /// The orbit target.
    pub fn target(&self) -> DVec3 {
        DVec3::new(
            self.target_x.value(),
            self.target_y.value(),
            self.target_z.value(),
        )
    }

    /// Camera position derived from the orbit parameters.
    pub fn camera_position(&self) -> DVec3 {
        self.snapshot().camera_position()
    }

    /// Vertical field of view, degrees.
    pub fn fov_deg(&self) -> f64 {
        self.fov_deg
    }

    /// Change the field of view.
    pub fn set_fov_deg(&mut self, fov_deg: f64) {
        if fov_deg.is_finite() {
            self.fov_deg = fov_deg;
        }
    }

    /// The active projection.
    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    /// The orthographic rectangle. Only meaningful in orthographic mode.
    pub fn ortho_rect(&self) -> OrthoRect {
        self.ortho
    }

    /// The perspective view in use just before the camera last entered orthographic mode.
    pub fn remembered_perspective_pose(&self) -> Option<&PoseSnapshot> {
        self.remembered_perspective.as_ref()
    }

    /// The floor height, if any.
    pub fn ground_level(&self) -> Option<f64> {
        self.ground_level
    }

    /// Change the floor height. The target is lifted onto a raised floor.
    pub fn set_ground_level(&mut self, ground_level: Option<f64>) {
        self.ground_level = ground_level.filter(|g| g.is_finite());
        if let Some(ground) = self.ground_level {
            if self.target_y.value() < ground {
                self.target_y.set_immediate(ground);
            }
        }
    }

    /// The distance bounds.
    pub fn distance_limits(&self) -> DistanceLimits {
        self.distance_limits
    }

    /// Replace the distance bounds, clamping the current distance into them.
    pub fn set_distance_limits(&mut self, limits: DistanceLimits) -> Result<()> {
        limits.validate()?;
        self.distance_limits = limits;
        self.distance.set_limits(Some(limits.min), limits.max);
        Ok(())
    }

    /// In-flight animated transitions.
    pub fn transitions(&self) -> &TransitionDriver {
        &self.transitions
    }

    /// Is an animated transition running?
    pub fn is_animating(&self) -> bool {
        self.transitions.is_animating()
    }

    /// Is there no pending motion to integrate?
    pub fn is_idle(&self) -> bool {
        self.params().iter().all(|p| p.is_idle())
    }

    /// Read one of the animatable parameters.
    pub fn param(&self, param: ParamId) -> &InertialParameter {
        match param {
            ParamId::Yaw => &self.yaw,
            ParamId::Pitch => &self.pitch,
            ParamId::Distance => &self.distance,
            ParamId::TargetX => &self.target_x,
            ParamId::TargetY => &self.target_y,
            ParamId::TargetZ => &self.target_z,
        }
    }

    fn param_mut(&mut self, param: ParamId) -> &mut InertialParameter {
        match param {
            ParamId::Yaw => &mut self.yaw,
            ParamId::Pitch => &mut self.pitch,
            ParamId::Distance => &mut self.distance,
            ParamId::TargetX => &mut self.target_x,
            ParamId::TargetY => &mut self.target_y,
            ParamId::TargetZ => &mut self.target_z,
        }
    }

    fn params(&self) -> [&InertialParameter; 6] {
        [
            &self.yaw,
            &self.pitch,
            &self.distance,
            &self.target_x,
            &self.target_y,
            &self.target_z,
        ]
    }

    fn params_mut(&mut self) -> [&mut InertialParameter; 6] {
        [
            &mut self.yaw,
            &mut self.pitch,
            &mut self.distance,
            &mut self.target_x,
            &mut self.target_y,
            &mut self.target_z,
        ]
    }

    /// Capture the live state.
    pub fn snapshot(&self) -> PoseSnapshot {
        PoseSnapshot {
            projection_mode: self.projection_mode,
            yaw_deg: self.yaw.value(),
            pitch_deg: self.pitch.value(),
            distance: self.distance.value(),
            target: self.target(),
            fov_deg: self.fov_deg,
            ortho: self.ortho,
        }
    }

    /// The pose as of the last refresh.
    pub fn cached_pose(&self) -> &CameraPose {
        &self.pose
    }

    /// The current pose, recomputed first if the live state changed.
    pub fn pose(&mut self) -> CameraPose {
        self.refresh_pose();
        self.pose
    }

    /// Recompute the pose if the live state differs from the state it was last computed from.
    /// Returns whether it changed.
    pub fn refresh_pose(&mut self) -> bool {
        let live = self.snapshot();
        if self.cached == Some(live) {
            return false;
        }
        self.pose = live.pose();
        self.cached = Some(live);
        true
    }

    // ---- Motion commands ----

    /// Orbit around the target. Leaves orthographic mode first.
    pub fn tumble(&mut self, dx: f64, dy: f64) {
        self.leave_ortho();
        let scale = TUMBLE_DEG_PER_UNIT * self.tumble_sensitivity;
        self.yaw.add_offset(dx * scale);
        self.pitch.add_offset(dy * scale);
    }

    /// Pan the target in the camera's screen plane. Input is scaled by distance and viewport height
    /// so that panning feels the same at any zoom level and window size. Leaves orthographic mode
    /// first.
    pub fn track(&mut self, dx: f64, dy: f64, viewport: &impl Viewport) {
        self.leave_ortho();
        let height = viewport.size().y as f64;
        if height <= 0.0 {
            return;
        }
        let scale = self.distance.value() * TRACK_SCALE * height.recip() * self.track_sensitivity;

        let target = self.target();
        let Some(forward) = (target - self.camera_position()).try_normalize() else {
            return;
        };
        let Some(right) = forward.cross(DVec3::Y).try_normalize() else {
            return;
        };
        let up = right.cross(forward);

        let delta = right * (dx * scale) + up * (dy * scale);
        self.target_x.add_offset(delta.x);
        self.target_y.add_offset(delta.y);
        self.target_z.add_offset(delta.z);
    }

    /// Zoom by a relative `factor`; positive moves away.
    ///
    /// In perspective the distance offset grows by `distance * factor`. In orthographic mode the
    /// change is applied at once and the visible rectangle is rescaled about its center.
    pub fn dolly(&mut self, factor: f64) {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                let delta = self.distance.value() * factor;
                self.distance.add_offset(delta);
            }
            ProjectionMode::Orthographic => {
                let old_distance = self.distance.value();
                let new_distance = self.distance_limits.clamp(old_distance * (1.0 + factor));
                let Some(rect) = rescale_ortho_rect(self.ortho, old_distance, new_distance) else {
                    debug!("Ignoring orthographic zoom to distance {new_distance}");
                    return;
                };
                self.distance.set_immediate(new_distance);
                self.ortho = rect;
            }
        }
    }

    /// Zoom all the way out, or all the way in to the minimum distance. Zooming in is refused while
    /// the minimum is zero: a camera sitting on its target has no distance left to scale back out.
    /// Returns whether a zoom was requested.
    pub fn dolly_to_limit(&mut self, outward: bool) -> bool {
        if outward {
            self.dolly(DOLLY_TO_LIMIT);
            return true;
        }
        if self.distance_limits.min <= 0.0 {
            debug!("Not zooming onto the target without a minimum distance");
            return false;
        }
        self.dolly(-DOLLY_TO_LIMIT);
        true
    }

    /// Animate to a picked point, zooming in if it is closer than the current target but never
    /// zooming out. Returns `false` when there is no hit.
    pub fn pick_target(&mut self, hit_point: Option<DVec3>) -> bool {
        let Some(hit_point) = hit_point else {
            return false;
        };
        let current = self.distance.value();
        let picked = (hit_point - self.camera_position()).length();
        self.move_camera(Some(hit_point), Some(current.min(picked)), None, None);
        true
    }

    /// Pick through `screen` with `picker`, then [`TransitionCam::pick_target`]. Misses are
    /// ignored.
    pub fn pick_at(&mut self, picker: &impl RayPick, screen: bevy_math::Vec2) -> bool {
        let result = picker.pick(screen);
        match (result.hit_object, result.hit_point) {
            (Some(_), Some(hit_point)) => self.pick_target(Some(hit_point)),
            (None, _) => {
                debug!("Pick at {screen} hit nothing");
                false
            }
            (Some(object), None) => {
                debug!("Pick at {screen} hit {object} without a hit point");
                false
            }
        }
    }

    /// Animate any of target, distance, pitch and yaw to new values. Absent values are left alone,
    /// and yaw takes the shorter way around. Leaves orthographic mode first. Returns the number of
    /// transitions issued.
    pub fn move_camera(
        &mut self,
        target: Option<DVec3>,
        distance: Option<f64>,
        pitch_deg: Option<f64>,
        yaw_deg: Option<f64>,
    ) -> usize {
        self.leave_ortho();
        let mut issued = Vec::new();
        if let Some(target) = target {
            let current = self.target();
            issued.push(self.transitions.enqueue(ParamId::TargetX, current.x, target.x));
            issued.push(self.transitions.enqueue(ParamId::TargetY, current.y, target.y));
            issued.push(self.transitions.enqueue(ParamId::TargetZ, current.z, target.z));
        }
        if let Some(distance) = distance {
            let current = self.distance.value();
            issued.push(self.transitions.enqueue(ParamId::Distance, current, distance));
        }
        if let Some(pitch) = pitch_deg {
            let current = self.pitch.value();
            issued.push(self.transitions.enqueue(ParamId::Pitch, current, pitch));
        }
        if let Some(yaw) = yaw_deg {
            let current = self.yaw.value();
            issued.push(self.transitions.enqueue_yaw(current, yaw));
        }
        issued.into_iter().flatten().count()
    }

    // ---- View commands ----

    /// Animate to a standard perspective view. Returns `true`; the command is always handled,
    /// even when the camera is already there.
    pub fn perspective_view(&mut self, view: StandardView) -> bool {
        let (yaw, pitch) = view.perspective_angles();
        self.change_perspective_view(yaw, pitch, None);
        true
    }

    /// Animate to the given perspective angles, and distance if provided. Returns the number of
    /// transitions issued, which is zero if the camera is already there.
    pub fn change_perspective_view(
        &mut self,
        yaw_deg: f64,
        pitch_deg: f64,
        distance: Option<f64>,
    ) -> usize {
        let current = self.snapshot();
        let wanted = PoseSnapshot {
            projection_mode: ProjectionMode::Perspective,
            yaw_deg,
            pitch_deg,
            distance: distance.unwrap_or(current.distance),
            ..current
        };
        if wanted == current {
            return 0;
        }
        let from = match current.projection_mode {
            ProjectionMode::Perspective => current,
            ProjectionMode::Orthographic => {
                let viewpoint = PoseSnapshot {
                    projection_mode: ProjectionMode::Perspective,
                    ..current
                };
                self.jump_to(viewpoint);
                viewpoint
            }
        };
        self.transitions.animate_between(&from, &wanted)
    }

    /// Jump to a standard orthographic view centered on the target.
    pub fn ortho_view(&mut self, view: StandardView, viewport: &impl Viewport) -> bool {
        let (yaw, pitch) = view.ortho_angles();
        self.ortho_view_at(yaw, pitch, viewport.aspect_ratio(), DVec2::ZERO);
        true
    }

    /// Jump to an orthographic view at the given angles. The rectangle is
    /// `distance * 2 * tan(fov)` wide, `width / aspect_ratio` high, and centered on `center`.
    /// Entering from perspective remembers the perspective pose.
    pub fn ortho_view_at(
        &mut self,
        yaw_deg: f64,
        pitch_deg: f64,
        aspect_ratio: f64,
        center: DVec2,
    ) {
        let current = self.snapshot();
        if current.projection_mode == ProjectionMode::Perspective {
            self.remembered_perspective = Some(current);
        }
        let width = current.distance * 2.0 * self.fov_deg.to_radians().tan();
        let height = if aspect_ratio > 0.0 {
            width / aspect_ratio
        } else {
            width
        };
        self.jump_to(PoseSnapshot {
            projection_mode: ProjectionMode::Orthographic,
            yaw_deg,
            pitch_deg,
            ortho: OrthoRect::from_center_size(center, width, height),
            ..current
        });
    }

    /// Switch projection. From perspective, jump to an orthographic view from the current angles.
    /// From orthographic, jump back to the remembered perspective pose, or to the same viewpoint if
    /// there is none.
    pub fn toggle_projection(&mut self, viewport: &impl Viewport) -> bool {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                let (yaw, pitch) = (self.yaw.value(), self.pitch.value());
                self.ortho_view_at(yaw, pitch, viewport.aspect_ratio(), DVec2::ZERO);
            }
            ProjectionMode::Orthographic => match self.remembered_perspective {
                Some(remembered) => self.jump_to(remembered),
                None => self.leave_ortho(),
            },
        }
        true
    }

    /// Ask the display to toggle fullscreen. Not part of the camera state.
    pub fn toggle_fullscreen(&self, display: &mut impl DisplayMode) -> bool {
        display.toggle_fullscreen()
    }

    /// Animate to the left perspective view.
    pub fn view_left(&mut self) -> bool {
        self.perspective_view(StandardView::Left)
    }

    /// Animate to the right perspective view.
    pub fn view_right(&mut self) -> bool {
        self.perspective_view(StandardView::Right)
    }

    /// Animate to the front perspective view.
    pub fn view_front(&mut self) -> bool {
        self.perspective_view(StandardView::Front)
    }

    /// Animate to the back perspective view.
    pub fn view_back(&mut self) -> bool {
        self.perspective_view(StandardView::Back)
    }

    /// Animate to the top perspective view.
    pub fn view_top(&mut self) -> bool {
        self.perspective_view(StandardView::Top)
    }

    /// Animate to the bottom perspective view.
    pub fn view_bottom(&mut self) -> bool {
        self.perspective_view(StandardView::Bottom)
    }

    /// Jump to the left orthographic view.
    pub fn ortho_left(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Left, viewport)
    }

    /// Jump to the right orthographic view.
    pub fn ortho_right(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Right, viewport)
    }

    /// Jump to the front orthographic view.
    pub fn ortho_front(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Front, viewport)
    }

    /// Jump to the back orthographic view.
    pub fn ortho_back(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Back, viewport)
    }

    /// Jump to the top orthographic view.
    pub fn ortho_top(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Top, viewport)
    }

    /// Jump to the bottom orthographic view.
    pub fn ortho_bottom(&mut self, viewport: &impl Viewport) -> bool {
        self.ortho_view(StandardView::Bottom, viewport)
    }

    // ---- State changes ----

    /// Replace the whole state with `snapshot`, discarding pending motion.
    pub fn jump_to(&mut self, snapshot: PoseSnapshot) {
        if snapshot.projection_mode != self.projection_mode {
            debug!(
                "Camera projection {:?} -> {:?}",
                self.projection_mode, snapshot.projection_mode
            );
        }
        self.yaw.set_immediate(snapshot.yaw_deg);
        self.pitch.set_immediate(snapshot.pitch_deg);
        self.distance.set_immediate(snapshot.distance);
        self.target_x.set_immediate(snapshot.target.x);
        self.target_y.set_immediate(snapshot.target.y);
        self.target_z.set_immediate(snapshot.target.z);
        self.projection_mode = snapshot.projection_mode;
        self.ortho = snapshot.ortho;
    }

    fn leave_ortho(&mut self) {
        if self.projection_mode == ProjectionMode::Orthographic {
            let viewpoint = PoseSnapshot {
                projection_mode: ProjectionMode::Perspective,
                ..self.snapshot()
            };
            self.jump_to(viewpoint);
        }
    }

    fn restore(&mut self, snapshot: &PoseSnapshot) {
        self.yaw.restore(snapshot.yaw_deg);
        self.pitch.restore(snapshot.pitch_deg);
        self.distance.restore(snapshot.distance);
        self.target_x.restore(snapshot.target.x);
        self.target_y.restore(snapshot.target.y);
        self.target_z.restore(snapshot.target.z);
        self.projection_mode = snapshot.projection_mode;
        self.ortho = snapshot.ortho;
    }

    fn violates_floor(&self) -> bool {
        let Some(ground) = self.ground_level else {
            return false;
        };
        self.target_y.value() < ground
            || self.camera_position().y < ground + CAMERA_FLOOR_CLEARANCE
    }

    // ---- Per frame ----

    /// Integrate pending motion. Call once per frame, after input has been sent.
    ///
    /// Elapsed time is measured with `clock` and normalized to 60 fps steps. The first update after
    /// the camera was idle counts as one step. If the result would put the target or camera below
    /// the ground, the whole step is undone and all pending motion dropped.
    ///
    /// The pose is not recomputed here; read it back with [`TransitionCam::pose`] or
    /// [`TransitionCam::refresh_pose`].
    pub fn update(&mut self, clock: &impl Clock) -> FrameOutcome {
        if self.is_idle() {
            self.last_update = None;
            return FrameOutcome::Idle;
        }

        let now = clock.now();
        let elapsed_secs = match self.last_update {
            Some(previous) => now.saturating_sub(previous).as_secs_f64(),
            None => BASELINE_FRAME_SECS,
        };
        self.last_update = Some(now);
        let steps = elapsed_secs / BASELINE_FRAME_SECS;

        let before = self.snapshot();
        let (integration, inertia) = (self.integration, self.inertia);
        for param in self.params_mut() {
            param.integrate(steps, integration, inertia);
        }

        if self.violates_floor() {
            trace!("Camera motion rejected below ground level {:?}", self.ground_level);
            self.restore(&before);
            for param in self.params_mut() {
                param.clear_offset();
            }
            FrameOutcome::RolledBack
        } else {
            FrameOutcome::Integrated
        }
    }

    /// Write one animated value. A finished sample retires its transition.
    pub fn apply_sample(&mut self, sample: PlaybackSample) {
        self.param_mut(sample.param).assign(sample.value);
        if sample.finished {
            self.transitions.retire(sample.id);
        }
    }

    /// Hand newly issued transitions to `playback`, advance it by `delta`, and apply what it
    /// produced. Returns whether any value was animated.
    pub fn drive_playback(
        &mut self,
        playback: &mut impl AnimationPlayback,
        delta: Duration,
    ) -> bool {
        for transition in self.transitions.take_unplayed() {
            playback.play(transition);
        }
        let samples = playback.advance(delta);
        let animated = !samples.is_empty();
        for sample in samples {
            self.apply_sample(sample);
        }
        animated
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec2;

    use super::*;
    use crate::controller::collaborators::PickResult;

    const VIEWPORT: Vec2 = Vec2::new(1600.0, 900.0);

    struct FixedPick(PickResult);

    impl RayPick for FixedPick {
        fn pick(&self, _screen: Vec2) -> PickResult {
            self.0
        }
    }

    struct Fullscreen(bool);

    impl DisplayMode for Fullscreen {
        fn toggle_fullscreen(&mut self) -> bool {
            self.0 = !self.0;
            true
        }
    }

    fn new_cam(settings: TransitionCamSettings) -> TransitionCam {
        TransitionCam::new(settings).unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn tumble_one_frame() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(0.0, 0.0)
            .with_orbit(DVec3::ZERO, 10.0));
        cam.tumble(3.0, 0.0);
        assert_eq!(cam.update(&secs(1.0)), FrameOutcome::Integrated);
        assert!((cam.yaw_deg() - 0.171).abs() < 1e-12);
        assert_eq!(cam.pitch_deg(), 0.0);
    }

    #[test]
    fn pitch_stays_in_bounds() {
        let mut cam = new_cam(TransitionCamSettings::default());
        let mut now = 0.0;
        for dy in [5000.0, -20000.0, 3.0, 40000.0, -1.0] {
            cam.tumble(0.0, dy);
            now += 1.0 / 60.0;
            cam.update(&secs(now));
            assert!(cam.pitch_deg() >= -PITCH_LIMIT_DEG && cam.pitch_deg() <= PITCH_LIMIT_DEG);
        }
        assert!(cam.pitch_deg() < PITCH_LIMIT_DEG);
    }

    #[test]
    fn distance_stays_in_bounds() {
        let mut cam = new_cam(
            TransitionCamSettings::default().with_distance_limits(1.0, Some(50.0)),
        );
        let mut now = 0.0;
        for factor in [10.0, -0.99, -0.99, -0.99, 0.5, 1e9, -0.999999] {
            cam.dolly(factor);
            now += 1.0 / 60.0;
            cam.update(&secs(now));
            assert!(cam.distance() >= 1.0 && cam.distance() <= 50.0);
        }
    }

    #[test]
    fn zooming_to_the_limit_never_strands_the_camera() {
        let mut cam = new_cam(TransitionCamSettings::default());
        assert!(!cam.dolly_to_limit(false));
        cam.update(&secs(1.0));
        assert_eq!(cam.distance(), 10.0);

        let mut cam = new_cam(
            TransitionCamSettings::default().with_distance_limits(2.0, Some(50.0)),
        );
        assert!(cam.dolly_to_limit(false));
        cam.update(&secs(1.0));
        assert_eq!(cam.distance(), 2.0);

        cam.dolly(0.5);
        cam.update(&secs(1.1));
        assert_eq!(cam.distance(), 3.0);

        assert!(cam.dolly_to_limit(true));
        cam.update(&secs(1.2));
        assert_eq!(cam.distance(), 50.0);
    }

    #[test]
    fn elapsed_time_scales_steps_and_idle_resets_tracker() {
        let mut cam = new_cam(TransitionCamSettings::default().with_inertia(0.5));
        cam.tumble(100.0, 0.0);
        cam.update(&secs(10.0));
        // First update after idle counts as one frame.
        assert!((cam.yaw_deg() - 5.7 * 0.5).abs() < 1e-9);

        // Two frames at 30 fps.
        cam.update(&secs(10.0 + 2.0 / 60.0));
        assert!((cam.yaw_deg() - 5.7 * (1.0 - 0.5f64.powi(3))).abs() < 1e-9);

        for i in 0..60 {
            cam.update(&secs(11.0 + i as f64 / 60.0));
        }
        assert!(cam.is_idle());
        assert_eq!(cam.update(&secs(100.0)), FrameOutcome::Idle);

        let yaw = cam.yaw_deg();
        cam.tumble(100.0, 0.0);
        cam.update(&secs(500.0));
        assert!((cam.yaw_deg() - yaw - 5.7 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn track_below_ground_rolls_back() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(20.0, 30.0)
            .with_orbit(DVec3::new(1.0, 0.5, -2.0), 10.0)
            .with_ground_level(0.0));
        let viewport = Vec2::new(800.0, 100.0);

        cam.track(0.0, 10.0, &viewport);
        assert_eq!(cam.update(&secs(1.0)), FrameOutcome::Integrated);
        assert!(cam.target().y > 0.5);

        let before = cam.snapshot();
        cam.track(0.0, -1000.0, &viewport);
        cam.tumble(50.0, 0.0);
        assert_eq!(cam.update(&secs(1.1)), FrameOutcome::RolledBack);
        assert_eq!(cam.snapshot(), before);
        assert_eq!(cam.yaw_deg(), before.yaw_deg);
        assert!(cam.is_idle());
        assert!(cam.target().y >= 0.0);
    }

    #[test]
    fn camera_below_floor_rolls_back() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(0.0, 30.0)
            .with_orbit(DVec3::ZERO, 10.0)
            .with_ground_level(0.0));
        let before = cam.snapshot();
        // Looking up from below would put the camera underground.
        cam.tumble(0.0, -30.0 / TUMBLE_DEG_PER_UNIT);
        assert_eq!(cam.update(&secs(1.0)), FrameOutcome::RolledBack);
        assert_eq!(cam.snapshot(), before);
    }

    #[test]
    fn target_starts_on_the_floor() {
        let cam = new_cam(TransitionCamSettings::default()
            .with_orbit(DVec3::new(0.0, -500.0, 0.0), 10.0)
            .with_floor());
        assert_eq!(cam.target().y, DEFAULT_GROUND_LEVEL);
    }

    #[test]
    fn track_moves_in_screen_plane() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(0.0, 0.0)
            .with_orbit(DVec3::ZERO, 10.0));
        cam.track(100.0, 0.0, &Vec2::new(100.0, 100.0));
        cam.update(&secs(1.0));
        // Looking down -Z, screen right is +X; 100 units at this height pan 10 * 0.1 * 1.
        assert!((cam.target() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);

        cam.track(0.0, 50.0, &Vec2::new(100.0, 100.0));
        cam.update(&secs(1.1));
        assert!((cam.target() - DVec3::new(1.0, 0.5, 0.0)).length() < 1e-9);
    }

    #[test]
    fn same_view_issues_nothing() {
        let mut cam = new_cam(TransitionCamSettings::default().with_angles(0.0, 5.0));
        assert!(cam.view_front());
        assert!(!cam.is_animating());
        assert_eq!(cam.change_perspective_view(0.0, 5.0, None), 0);

        assert!(cam.view_top());
        assert_eq!(cam.transitions().active().len(), 1);
        assert_eq!(cam.transitions().active()[0].param, ParamId::Pitch);
    }

    #[test]
    fn view_yaw_takes_short_path() {
        let mut cam = new_cam(TransitionCamSettings::default().with_angles(350.0, 5.0));
        assert_eq!(cam.move_camera(None, None, None, Some(10.0)), 1);
        let t = cam.transitions().active()[0];
        assert_eq!(t.param, ParamId::Yaw);
        assert_eq!(t.end - t.start, 20.0);
    }

    #[test]
    fn perspective_view_from_ortho_jumps_then_animates() {
        let mut cam = new_cam(TransitionCamSettings::default());
        cam.ortho_front(&VIEWPORT);
        assert_eq!(cam.projection_mode(), ProjectionMode::Orthographic);

        cam.view_left();
        assert_eq!(cam.projection_mode(), ProjectionMode::Perspective);
        // Still at the ortho viewpoint; the animation will take it to the left view.
        assert_eq!(cam.yaw_deg(), 0.0);
        assert_eq!(cam.pitch_deg(), 0.0);
        let params: Vec<_> = cam.transitions().active().iter().map(|t| t.param).collect();
        assert_eq!(params, vec![ParamId::Yaw, ParamId::Pitch]);
    }

    #[test]
    fn ortho_view_geometry() {
        let mut cam = new_cam(TransitionCamSettings::default().with_orbit(DVec3::ZERO, 10.0));
        assert!(cam.ortho_top(&Vec2::new(200.0, 100.0)));
        let width = 10.0 * 2.0 * 15f64.to_radians().tan();
        let rect = cam.ortho_rect();
        assert!((rect.width() - width).abs() < 1e-12);
        assert!((rect.height() - width / 2.0).abs() < 1e-12);
        assert_eq!(rect.center(), DVec2::ZERO);
        assert_eq!(cam.pitch_deg(), PITCH_LIMIT_DEG);
        assert!(!cam.is_animating());
    }

    #[test]
    fn ortho_dolly_keeps_center() {
        let mut cam = new_cam(TransitionCamSettings::default().with_orbit(DVec3::ZERO, 10.0));
        cam.ortho_view_at(0.0, 0.0, 1.5, DVec2::new(2.0, -1.0));
        let before = cam.ortho_rect();

        cam.dolly(1.0);
        let after = cam.ortho_rect();
        assert_eq!(cam.distance(), 20.0);
        assert!((after.center() - before.center()).length() < 1e-12);
        assert!((after.width() - before.width() * 2.0).abs() < 1e-9);
        assert!((after.height() - before.height() * 2.0).abs() < 1e-9);
        assert!(cam.is_idle());
        assert_eq!(cam.projection_mode(), ProjectionMode::Orthographic);

        cam.dolly(-0.5);
        assert_eq!(cam.distance(), 10.0);
        assert!((cam.ortho_rect().width() - before.width()).abs() < 1e-9);
    }

    #[test]
    fn ortho_dolly_to_zero_is_ignored() {
        let mut cam = new_cam(TransitionCamSettings::default());
        cam.ortho_front(&VIEWPORT);
        let before = cam.snapshot();
        cam.dolly(-9_999_999.0);
        assert_eq!(cam.snapshot(), before);
    }

    #[test]
    fn ortho_round_trip_restores_perspective() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(33.3, 12.5)
            .with_orbit(DVec3::new(1.0, 2.0, 3.0), 7.25));
        let before = cam.snapshot();
        assert!(cam.remembered_perspective_pose().is_none());

        cam.ortho_top(&VIEWPORT);
        cam.ortho_left(&VIEWPORT);
        assert_eq!(cam.remembered_perspective_pose(), Some(&before));

        cam.toggle_projection(&VIEWPORT);
        assert_eq!(cam.projection_mode(), ProjectionMode::Perspective);
        assert_eq!(cam.yaw_deg(), before.yaw_deg);
        assert_eq!(cam.pitch_deg(), before.pitch_deg);
        assert_eq!(cam.distance(), before.distance);
        assert_eq!(cam.target(), before.target);
    }

    #[test]
    fn toggle_projection_enters_ortho_at_current_angles() {
        let mut cam = new_cam(TransitionCamSettings::default().with_angles(45.0, 20.0));
        cam.toggle_projection(&VIEWPORT);
        assert_eq!(cam.projection_mode(), ProjectionMode::Orthographic);
        assert_eq!(cam.yaw_deg(), 45.0);
        assert_eq!(cam.pitch_deg(), 20.0);
    }

    #[test]
    fn tumble_and_track_leave_ortho() {
        let mut cam = new_cam(TransitionCamSettings::default());
        cam.ortho_back(&VIEWPORT);
        cam.tumble(1.0, 0.0);
        assert_eq!(cam.projection_mode(), ProjectionMode::Perspective);
        assert_eq!(cam.yaw_deg(), 180.0);

        cam.ortho_right(&VIEWPORT);
        cam.track(1.0, 0.0, &VIEWPORT);
        assert_eq!(cam.projection_mode(), ProjectionMode::Perspective);
        assert_eq!(cam.yaw_deg(), 270.0);
    }

    #[test]
    fn pick_never_zooms_out() {
        let mut cam = new_cam(TransitionCamSettings::default()
            .with_angles(0.0, 0.0)
            .with_orbit(DVec3::ZERO, 20.0));
        // Camera at z = 20; the hit is 8 away.
        let hit = DVec3::new(0.0, 0.0, 12.0);
        assert!(cam.pick_target(Some(hit)));
        let distance = cam
            .transitions()
            .active()
            .iter()
            .find(|t| t.param == ParamId::Distance)
            .unwrap();
        assert!((distance.end - 8.0).abs() < 1e-9);

        let mut far = new_cam(TransitionCamSettings::default()
            .with_angles(0.0, 0.0)
            .with_orbit(DVec3::ZERO, 20.0));
        far.pick_target(Some(DVec3::new(5.0, 0.0, -30.0)));
        assert!(far
            .transitions()
            .active()
            .iter()
            .all(|t| t.param != ParamId::Distance));
    }

    #[test]
    fn missing_hits_are_ignored() {
        let mut cam = new_cam(TransitionCamSettings::default());
        assert!(!cam.pick_target(None));

        let no_point = FixedPick(PickResult {
            hit_point: None,
            hit_object: Some(Entity::PLACEHOLDER),
        });
        assert!(!cam.pick_at(&no_point, Vec2::ZERO));
        let no_object = FixedPick(PickResult {
            hit_point: Some(DVec3::ONE),
            hit_object: None,
        });
        assert!(!cam.pick_at(&no_object, Vec2::ZERO));
        assert!(!cam.is_animating());

        let hit = FixedPick(PickResult {
            hit_point: Some(DVec3::ONE),
            hit_object: Some(Entity::PLACEHOLDER),
        });
        assert!(cam.pick_at(&hit, Vec2::ZERO));
        assert!(cam.is_animating());
    }

    #[test]
    fn pick_from_ortho_returns_to_perspective() {
        let mut cam = new_cam(TransitionCamSettings::default());
        cam.ortho_front(&VIEWPORT);
        cam.pick_target(Some(DVec3::new(1.0, 0.0, 0.0)));
        assert_eq!(cam.projection_mode(), ProjectionMode::Perspective);
    }

    #[test]
    fn playback_drives_values_and_retires() {
        let mut cam = new_cam(TransitionCamSettings::default().with_angles(0.0, 5.0));
        cam.view_left();
        let mut playback = TransitionPlayback::default();

        assert!(cam.drive_playback(&mut playback, secs(0.5)));
        assert!((cam.yaw_deg() - 45.0).abs() < 1e-9);
        assert!(cam.is_animating());

        assert!(cam.drive_playback(&mut playback, secs(0.6)));
        assert_eq!(cam.yaw_deg(), 90.0);
        assert!(!cam.is_animating());
        assert!(!cam.drive_playback(&mut playback, secs(0.1)));
    }

    #[test]
    fn pose_is_recomputed_only_when_state_changes() {
        let mut cam = new_cam(TransitionCamSettings::default());
        assert!(!cam.refresh_pose());

        cam.tumble(10.0, 0.0);
        assert!(!cam.refresh_pose());
        // Integration leaves the refresh to whoever consumes the pose.
        cam.update(&secs(1.0));
        assert!(cam.refresh_pose());
        assert!(!cam.refresh_pose());
        let pose = cam.pose();
        assert!((pose.position - cam.camera_position()).length() < 1e-12);

        cam.set_fov_deg(15.0 + 1e-4);
        assert!(!cam.refresh_pose());
        cam.set_fov_deg(30.0);
        assert!(cam.refresh_pose());
    }

    #[test]
    fn fullscreen_is_delegated() {
        let cam = new_cam(TransitionCamSettings::default());
        let mut display = Fullscreen(false);
        assert!(cam.toggle_fullscreen(&mut display));
        assert!(display.0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert_eq!(
            TransitionCam::new(
                TransitionCamSettings::default().with_distance_limits(10.0, Some(1.0)),
            )
            .unwrap_err(),
            SettingsError::InvalidDistanceRange { min: 10.0, max: 1.0 }
        );
        assert!(matches!(
            TransitionCam::new(TransitionCamSettings {
                fov_deg: f64::NAN,
                ..Default::default()
            }),
            Err(SettingsError::NonFinite("fov_deg"))
        ));
        assert!(matches!(
            TransitionCam::new(TransitionCamSettings {
                transition_frames: 0,
                ..Default::default()
            }),
            Err(SettingsError::InvalidTransition { .. })
        ));

        let mut cam = new_cam(TransitionCamSettings::default());
        assert!(cam
            .set_distance_limits(DistanceLimits::new(3.0, Some(2.0)))
            .is_err());
        cam.set_distance_limits(DistanceLimits::new(1.0, Some(5.0)))
            .unwrap();
        assert_eq!(cam.distance(), 5.0);
    }
}
