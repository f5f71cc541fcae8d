use glam::{EulerRot, Quat, Vec3};

use crate::capability::CharacterBody;

/// Decoupled look model: yaw belongs to the body and steers movement, pitch
/// belongs to the head and is purely visual.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub body_yaw: f32,
    pub head_pitch: f32,
}

impl Orientation {
    /// Body rotation. Never contains pitch.
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.body_yaw)
    }

    /// Unit forward on the ground plane; +Z at yaw 0.
    pub fn body_forward(&self) -> Vec3 {
        self.body_rotation() * Vec3::Z
    }

    /// Unit left on the ground plane; +X at yaw 0.
    pub fn body_left(&self) -> Vec3 {
        self.body_rotation() * Vec3::X
    }

    /// Camera rotation: yaw about the vertical axis, then pitch about the local lateral axis, no roll.
    pub fn compose(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.body_yaw, self.head_pitch, 0.0)
    }
}

/// Keeps an angle in `(-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Steepest look angle the rig allows; at 90 degrees the view flips.
pub const PITCH_LIMIT: f32 = 89.9 * std::f32::consts::PI / 180.0;
const DEFAULT_MAX_PITCH: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// First-person camera rig. Owns the orientation and projects it onto the
/// camera transform once per frame.
#[derive(Debug, Clone)]
pub struct CameraRig {
    orientation: Orientation,
    sensitivity: f32,
    max_pitch: f32,
    eye_height: f32,
    position: Vec3,
    rotation: Quat,
}

impl CameraRig {
    /// `max_pitch` in radians.
    /// `max_pitch` is kept within `(0, PITCH_LIMIT]`; a zero or non-finite
    /// value falls back to 85 degrees.
    pub fn new(sensitivity: f32, max_pitch: f32, eye_height: f32) -> Self {
        let max_pitch = if max_pitch.is_finite() && max_pitch != 0.0 {
            max_pitch.abs().min(PITCH_LIMIT)
        } else {
            tracing::warn!("Invalid max pitch {}, using 85 degrees", max_pitch);
            DEFAULT_MAX_PITCH
        };
        Self {
            orientation: Orientation::default(),
            sensitivity,
            max_pitch,
            eye_height,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn max_pitch(&self) -> f32 {
        self.max_pitch
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    /// Turn the body. Keeps the character's view direction in step so facing
    /// and walking agree.
    pub fn apply_yaw<C: CharacterBody + ?Sized>(&mut self, delta: f32, character: &mut C) {
        if !delta.is_finite() {
            return;
        }
        self.orientation.body_yaw = wrap_angle(self.orientation.body_yaw + delta * self.sensitivity);
        character.set_view_direction(self.orientation.body_forward());
    }

    /// Tilt the head, clamped to the pitch limits. Positive looks down.
    pub fn apply_pitch(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.orientation.head_pitch = (self.orientation.head_pitch + delta * self.sensitivity)
            .clamp(-self.max_pitch, self.max_pitch);
    }

    /// Place the camera at eye height above the character and rebuild its
    /// rotation from the current pitch and body yaw.
    pub fn sync(&mut self, character_position: Vec3) {
        self.position = character_position + Vec3::new(0.0, self.eye_height, 0.0);
        self.rotation = self.orientation.compose();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Unit view direction.
    pub fn direction(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}
