//! Physical key and mouse translation into logical input events.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use winit::event::{DeviceEvent, ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use bunker_core::input::{InputAction, InputEvent};

/// Logical action name to key names, from `input/bindings.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputBindings {
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<String>>,
    /// Multiplier on raw mouse deltas before they reach `LookX`/`LookY`.
    #[serde(default = "default_mouse_scale")]
    pub mouse_scale: f32,
    #[serde(default)]
    pub invert_y: bool,
}

fn default_mouse_scale() -> f32 {
    1.0
}

impl Default for InputBindings {
    fn default() -> Self {
        let mut actions = BTreeMap::new();
        actions.insert("MoveForward".into(), vec!["W".into(), "ArrowUp".into()]);
        actions.insert("MoveBack".into(), vec!["S".into(), "ArrowDown".into()]);
        actions.insert("StrafeLeft".into(), vec!["A".into(), "ArrowLeft".into()]);
        actions.insert("StrafeRight".into(), vec!["D".into(), "ArrowRight".into()]);
        actions.insert("Jump".into(), vec!["Space".into()]);
        actions.insert("ExitDoor".into(), vec!["R".into()]);
        actions.insert("ToggleMenu".into(), vec!["Escape".into()]);

        Self {
            actions,
            mouse_scale: default_mouse_scale(),
            invert_y: false,
        }
    }
}

/// Load input bindings from a YAML file, with defaults as fallback.
pub fn load_bindings(path: &Path) -> InputBindings {
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(bindings) => {
                    tracing::info!("Loaded input bindings from {:?}", path);
                    return bindings;
                }
                Err(e) => tracing::warn!("Failed to parse {:?}: {}", path, e),
            },
            Err(e) => tracing::warn!("Failed to read {:?}: {}", path, e),
        }
    }
    tracing::info!("Using default input bindings");
    InputBindings::default()
}

/// Maps key name strings to winit KeyCode.
pub fn key_name_to_code(name: &str) -> Option<KeyCode> {
    match name {
        "A" => Some(KeyCode::KeyA),
        "B" => Some(KeyCode::KeyB),
        "C" => Some(KeyCode::KeyC),
        "D" => Some(KeyCode::KeyD),
        "E" => Some(KeyCode::KeyE),
        "F" => Some(KeyCode::KeyF),
        "Q" => Some(KeyCode::KeyQ),
        "R" => Some(KeyCode::KeyR),
        "S" => Some(KeyCode::KeyS),
        "W" => Some(KeyCode::KeyW),
        "Z" => Some(KeyCode::KeyZ),
        "X" => Some(KeyCode::KeyX),
        "Space" => Some(KeyCode::Space),
        "ShiftLeft" => Some(KeyCode::ShiftLeft),
        "ControlLeft" => Some(KeyCode::ControlLeft),
        "Escape" => Some(KeyCode::Escape),
        "Enter" => Some(KeyCode::Enter),
        "Tab" => Some(KeyCode::Tab),
        "ArrowUp" => Some(KeyCode::ArrowUp),
        "ArrowDown" => Some(KeyCode::ArrowDown),
        "ArrowLeft" => Some(KeyCode::ArrowLeft),
        "ArrowRight" => Some(KeyCode::ArrowRight),
        _ => None,
    }
}

/// Turns winit events into `InputEvent`s. Key repeats are swallowed so each
/// physical press yields exactly one press event.
pub struct InputMapper {
    keys: HashMap<KeyCode, Vec<InputAction>>,
    held: HashSet<KeyCode>,
    mouse_scale: f32,
    invert_y: bool,
}

impl InputMapper {
    pub fn new(bindings: &InputBindings) -> Self {
        let mut keys: HashMap<KeyCode, Vec<InputAction>> = HashMap::new();
        for (action_name, key_names) in &bindings.actions {
            let Some(action) = InputAction::from_name(action_name) else {
                tracing::warn!("Unknown action '{}' in bindings", action_name);
                continue;
            };
            if action.is_analog() {
                tracing::warn!("Action '{}' is bound to the mouse, ignoring keys", action_name);
                continue;
            }
            for key_name in key_names {
                match key_name_to_code(key_name) {
                    Some(code) => keys.entry(code).or_default().push(action),
                    None => tracing::warn!("Unknown key '{}' for action '{}'", key_name, action_name),
                }
            }
        }

        Self {
            keys,
            held: HashSet::new(),
            mouse_scale: bindings.mouse_scale,
            invert_y: bindings.invert_y,
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => self.key(code, event.state == ElementState::Pressed),
                PhysicalKey::Unidentified(_) => Vec::new(),
            },
            // Focus loss swallows releases; let go of everything.
            WindowEvent::Focused(false) => self.release_all(),
            _ => Vec::new(),
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> Vec<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta } => self.mouse_motion(delta.0 as f32, delta.1 as f32),
            _ => Vec::new(),
        }
    }

    pub fn key(&mut self, code: KeyCode, pressed: bool) -> Vec<InputEvent> {
        if pressed && !self.held.insert(code) {
            return Vec::new();
        }
        if !pressed && !self.held.remove(&code) {
            return Vec::new();
        }
        self.events_for(code, pressed)
    }

    pub fn mouse_motion(&mut self, dx: f32, dy: f32) -> Vec<InputEvent> {
        let dy = if self.invert_y { -dy } else { dy };
        let mut events = Vec::with_capacity(2);
        if dx != 0.0 {
            events.push(InputEvent::analog(InputAction::LookX, dx * self.mouse_scale));
        }
        if dy != 0.0 {
            events.push(InputEvent::analog(InputAction::LookY, dy * self.mouse_scale));
        }
        events
    }

    pub fn release_all(&mut self) -> Vec<InputEvent> {
        let held: Vec<KeyCode> = self.held.drain().collect();
        held.into_iter().flat_map(|code| self.events_for(code, false)).collect()
    }

    fn events_for(&self, code: KeyCode, pressed: bool) -> Vec<InputEvent> {
        self.keys
            .get(&code)
            .map(|actions| {
                actions
                    .iter()
                    .map(|&action| {
                        if pressed {
                            InputEvent::press(action)
                        } else {
                            InputEvent::release(action)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
