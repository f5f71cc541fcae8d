//! bunker.yaml project configuration.
//!
//! Every field is defaulted so an empty file (or no file at all) gives the
//! stock bunker walk-through.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::focus::FocusSettings;
use crate::lights::ShadowSettings;
use crate::post::PostSettings;

pub const CONFIG_FILE: &str = "bunker.yaml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BunkerConfig {
    /// Scene YAML relative to the project root.
    #[serde(default = "default_scene")]
    pub scene: String,
    #[serde(default)]
    pub player: PlayerSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub focus: FocusSettings,
    #[serde(default)]
    pub shadows: ShadowSettings,
    #[serde(default)]
    pub post: PostSettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub input: InputSettings,
}

fn default_scene() -> String {
    "scenes/bunker.yaml".to_string()
}

impl Default for BunkerConfig {
    fn default() -> Self {
        Self {
            scene: default_scene(),
            player: PlayerSettings::default(),
            camera: CameraSettings::default(),
            focus: FocusSettings::default(),
            shadows: ShadowSettings::default(),
            post: PostSettings::default(),
            audio: AudioSettings::default(),
            input: InputSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    /// Used when the scene has no `player.spawn`.
    #[serde(default)]
    pub spawn: Option<[f32; 3]>,
    #[serde(default = "default_eye_height")]
    pub eye_height: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_jump_speed")]
    pub jump_speed: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
}

fn default_eye_height() -> f32 {
    5.3
}
fn default_radius() -> f32 {
    0.5
}
fn default_height() -> f32 {
    5.5
}
fn default_walk_speed() -> f32 {
    5.0
}
fn default_jump_speed() -> f32 {
    6.0
}
fn default_gravity() -> f32 {
    -9.81
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            spawn: None,
            eye_height: default_eye_height(),
            radius: default_radius(),
            height: default_height(),
            walk_speed: default_walk_speed(),
            jump_speed: default_jump_speed(),
            gravity: default_gravity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraSettings {
    /// Radians per analog input unit.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_max_pitch")]
    pub max_pitch_degrees: f32,
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_sensitivity() -> f32 {
    0.002
}
fn default_max_pitch() -> f32 {
    85.0
}
fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.01
}
fn default_far() -> f32 {
    1000.0
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            max_pitch_degrees: default_max_pitch(),
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl CameraSettings {
    pub fn max_pitch_radians(&self) -> f32 {
        self.max_pitch_degrees.to_radians()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioSettings {
    /// `0.0..=1.0`.
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
    #[serde(default)]
    pub ambient: Option<AmbientSound>,
}

fn default_master_volume() -> f32 {
    0.75
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            ambient: None,
        }
    }
}

/// Non-positional background loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmbientSound {
    pub path: String,
    #[serde(default = "default_ambient_volume")]
    pub volume: f32,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

fn default_ambient_volume() -> f32 {
    1.0
}
fn default_looping() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputSettings {
    /// Key bindings YAML relative to the project root.
    #[serde(default = "default_bindings")]
    pub bindings: String,
}

fn default_bindings() -> String {
    "input/bindings.yaml".to_string()
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

/// Walk up from `start_dir` looking for `bunker.yaml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a `bunker.yaml` file.
pub fn load_config(path: &Path) -> Result<BunkerConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<BunkerConfig, ConfigError> {
    // serde_yaml maps an empty document to unit, not an empty mapping.
    if contents.trim().is_empty() {
        return Ok(BunkerConfig::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}
