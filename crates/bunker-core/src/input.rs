//! Logical input actions. Physical keys and mouse axes are mapped to these
//! names by the client; the simulation only ever sees the names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    StrafeLeft,
    StrafeRight,
    Jump,
    /// Horizontal look, raw mouse delta (right positive).
    LookX,
    /// Vertical look, raw mouse delta (down positive).
    LookY,
    ExitDoor,
    ToggleMenu,
}

impl InputAction {
    pub const ALL: [InputAction; 9] = [
        InputAction::MoveForward,
        InputAction::MoveBack,
        InputAction::StrafeLeft,
        InputAction::StrafeRight,
        InputAction::Jump,
        InputAction::LookX,
        InputAction::LookY,
        InputAction::ExitDoor,
        InputAction::ToggleMenu,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MoveForward" => Some(InputAction::MoveForward),
            "MoveBack" => Some(InputAction::MoveBack),
            "StrafeLeft" => Some(InputAction::StrafeLeft),
            "StrafeRight" => Some(InputAction::StrafeRight),
            "Jump" => Some(InputAction::Jump),
            "LookX" => Some(InputAction::LookX),
            "LookY" => Some(InputAction::LookY),
            "ExitDoor" => Some(InputAction::ExitDoor),
            "ToggleMenu" => Some(InputAction::ToggleMenu),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputAction::MoveForward => "MoveForward",
            InputAction::MoveBack => "MoveBack",
            InputAction::StrafeLeft => "StrafeLeft",
            InputAction::StrafeRight => "StrafeRight",
            InputAction::Jump => "Jump",
            InputAction::LookX => "LookX",
            InputAction::LookY => "LookY",
            InputAction::ExitDoor => "ExitDoor",
            InputAction::ToggleMenu => "ToggleMenu",
        }
    }

    /// Analog actions carry a value and have no press/release.
    pub fn is_analog(&self) -> bool {
        matches!(self, InputAction::LookX | InputAction::LookY)
    }

    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            InputAction::MoveForward
                | InputAction::MoveBack
                | InputAction::StrafeLeft
                | InputAction::StrafeRight
        )
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One input event as delivered to `Simulation::handle_input_event`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub action: String,
    pub value: f32,
    pub pressed: bool,
}

impl InputEvent {
    pub fn press(action: InputAction) -> Self {
        Self {
            action: action.name().to_string(),
            value: 1.0,
            pressed: true,
        }
    }

    pub fn release(action: InputAction) -> Self {
        Self {
            action: action.name().to_string(),
            value: 0.0,
            pressed: false,
        }
    }

    pub fn analog(action: InputAction, value: f32) -> Self {
        Self {
            action: action.name().to_string(),
            value,
            pressed: false,
        }
    }
}
