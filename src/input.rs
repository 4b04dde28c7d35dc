//! Default input mappings. Each adapter turns raw mouse, wheel or keyboard input into
//! [`TransitionCam`] commands and does nothing else.
//!
//! | Input | Command |
//! |---|---|
//! | Left drag | tumble; track with Alt held or in orthographic mode |
//! | Right drag | track |
//! | Right click without moving | pick a new target under the cursor |
//! | Wheel | dolly |
//! | Arrow keys | tumble; track with Alt held or in orthographic mode |
//! | `[` / `]` | dolly out / in; with Alt, all the way out, or in to a positive minimum distance |
//! | `L` `R` `F` `B` `T` `U` | left, right, front, back, top, bottom perspective views |
//! | Shift + the same letters | the orthographic versions |
//! | Shift + `A` | toggle fullscreen |

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
    InputSystem,
};
use bevy_math::{prelude::*, DVec2};
use bevy_picking::{hover::HoverMap, PickSet};
use bevy_render::prelude::*;
use bevy_window::{PrimaryWindow, Window};

use crate::{
    controller::{
        collaborators::{DisplayMode, HoverPick},
        snapshot::ProjectionMode,
        TransitionCamSystems,
    },
    prelude::*,
};

/// Tumble units per arrow key press.
pub const ARROW_TUMBLE: f64 = 3.0;
/// Track units per arrow key press.
pub const ARROW_TRACK: f64 = 10.0;
/// Unit direction of each arrow key, in screen space with y pointing down like pointer motion.
pub const ARROW_DIRECTIONS: [(KeyCode, DVec2); 4] = [
    (KeyCode::ArrowLeft, DVec2::NEG_X),
    (KeyCode::ArrowRight, DVec2::X),
    (KeyCode::ArrowUp, DVec2::NEG_Y),
    (KeyCode::ArrowDown, DVec2::Y),
];
/// Dolly factor per bracket key press.
pub const BRACKET_DOLLY: f64 = 0.05;
/// Dolly factor per line based wheel event.
pub const WHEEL_LINE_DOLLY: f64 = 1.0 / 20.0;
/// Pixels per wheel "line", before `wheel_precision`.
pub const WHEEL_PIXELS_PER_STEP: f64 = 10.0 * 16.0;

/// See the [module](self) docs.
pub struct TransitionCamInputPlugin;

impl Plugin for TransitionCamInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PreUpdate,
            (pointer_input, wheel_input, keyboard_input)
                .in_set(TransitionCamSystems::Input)
                .after(InputSystem)
                .after(PickSet::Hover),
        );
    }
}

fn alt_held(keys: &ButtonInput<KeyCode>) -> bool {
    keys.any_pressed([KeyCode::AltLeft, KeyCode::AltRight])
}

fn shift_held(keys: &ButtonInput<KeyCode>) -> bool {
    keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight])
}

/// Tracks whether the right button moved while it was held, to tell a click from a drag.
#[derive(Default)]
pub struct RightClick {
    moved: bool,
}

/// Drag to tumble or track, right click to pick.
pub fn pointer_input(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    motion: Res<AccumulatedMouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    hover_map: Option<Res<HoverMap>>,
    mut right_click: Local<RightClick>,
    mut cameras: Query<(Entity, &Camera, &mut TransitionCam)>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    if mouse.just_pressed(MouseButton::Right) {
        right_click.moved = false;
    }
    let delta = motion.delta.as_dvec2();
    let moving = delta != DVec2::ZERO;
    if moving && mouse.pressed(MouseButton::Right) {
        right_click.moved = true;
    }
    let alt = alt_held(&keys);

    for (entity, camera, mut cam) in &mut cameras {
        if !camera.is_active {
            continue;
        }
        if moving && mouse.pressed(MouseButton::Left) {
            if alt || cam.projection_mode() == ProjectionMode::Orthographic {
                cam.track(-delta.x, delta.y, window);
            } else {
                cam.tumble(-delta.x, delta.y);
            }
        }
        if moving && mouse.pressed(MouseButton::Right) {
            cam.track(-delta.x, delta.y, window);
        }
        if mouse.just_released(MouseButton::Right) && !right_click.moved {
            let (Some(hover_map), Some(cursor)) = (hover_map.as_deref(), window.cursor_position())
            else {
                continue;
            };
            let picker = HoverPick {
                hover_map,
                camera: entity,
            };
            cam.pick_at(&picker, cursor);
        }
    }
}

/// Zoom with the mouse wheel.
pub fn wheel_input(
    mut wheel: EventReader<MouseWheel>,
    mut cameras: Query<(&Camera, &mut TransitionCam)>,
) {
    for event in wheel.read() {
        if event.y == 0.0 {
            continue;
        }
        for (camera, mut cam) in &mut cameras {
            if !camera.is_active {
                continue;
            }
            let factor = match event.unit {
                MouseScrollUnit::Line => -(event.y.signum() as f64) * WHEEL_LINE_DOLLY,
                MouseScrollUnit::Pixel => {
                    -(event.y as f64) / (cam.wheel_precision * WHEEL_PIXELS_PER_STEP)
                }
            };
            cam.dolly(factor);
        }
    }
}

/// Arrow keys, brackets and view shortcuts.
pub fn keyboard_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut cameras: Query<(&Camera, &mut TransitionCam)>,
) {
    let Ok(mut window) = windows.single_mut() else {
        return;
    };
    let (alt, shift) = (alt_held(&keys), shift_held(&keys));

    if shift && keys.just_pressed(KeyCode::KeyA) {
        window.toggle_fullscreen();
    }

    let views = [
        (KeyCode::KeyL, StandardView::Left),
        (KeyCode::KeyR, StandardView::Right),
        (KeyCode::KeyF, StandardView::Front),
        (KeyCode::KeyB, StandardView::Back),
        (KeyCode::KeyT, StandardView::Top),
        (KeyCode::KeyU, StandardView::Bottom),
    ];

    for (camera, mut cam) in &mut cameras {
        if !camera.is_active {
            continue;
        }
        for (key, direction) in ARROW_DIRECTIONS {
            if !keys.pressed(key) {
                continue;
            }
            if alt || cam.projection_mode() == ProjectionMode::Orthographic {
                let delta = direction * ARROW_TRACK;
                cam.track(delta.x, delta.y, &*window);
            } else {
                let delta = direction * ARROW_TUMBLE;
                cam.tumble(delta.x, delta.y);
            }
        }

        if alt {
            if keys.just_pressed(KeyCode::BracketLeft) {
                cam.dolly_to_limit(true);
            }
            if keys.just_pressed(KeyCode::BracketRight) {
                cam.dolly_to_limit(false);
            }
        } else {
            if keys.pressed(KeyCode::BracketLeft) {
                cam.dolly(BRACKET_DOLLY);
            }
            if keys.pressed(KeyCode::BracketRight) {
                cam.dolly(-BRACKET_DOLLY);
            }
        }

        for (key, view) in views {
            if !keys.just_pressed(key) {
                continue;
            }
            if shift {
                cam.ortho_view(view, &*window);
            } else {
                cam.perspective_view(view);
            }
        }
    }
}
