//! Post-processing parameters. The filters themselves live in the renderer;
//! this module only decides what values they get.

use serde::{Deserialize, Serialize};

use crate::capability::{ParamValue, Renderer};
use crate::focus::FocusState;

pub const SSAO: &str = "ssao";
pub const BLOOM: &str = "bloom";
pub const TONE_MAP: &str = "tone_map";
pub const DEPTH_OF_FIELD: &str = "depth_of_field";
pub const FXAA: &str = "fxaa";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SsaoSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ssao_radius")]
    pub radius: f32,
    #[serde(default = "default_ssao_intensity")]
    pub intensity: f32,
    #[serde(default = "default_one")]
    pub scale: f32,
    #[serde(default = "default_ssao_bias")]
    pub bias: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BloomSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bloom_intensity")]
    pub intensity: f32,
    /// Bloom from the whole scene rather than glow-tagged objects only.
    #[serde(default = "default_true")]
    pub scene_glow: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToneMapSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_white_point")]
    pub white_point: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DepthOfFieldSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_blur_scale")]
    pub blur_scale: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FxaaSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostSettings {
    #[serde(default)]
    pub ssao: SsaoSettings,
    #[serde(default)]
    pub bloom: BloomSettings,
    #[serde(default)]
    pub tone_map: ToneMapSettings,
    #[serde(default)]
    pub depth_of_field: DepthOfFieldSettings,
    #[serde(default)]
    pub fxaa: FxaaSettings,
}

fn default_true() -> bool {
    true
}
fn default_one() -> f32 {
    1.0
}
fn default_ssao_radius() -> f32 {
    6.0
}
fn default_ssao_intensity() -> f32 {
    10.0
}
fn default_ssao_bias() -> f32 {
    0.1
}
fn default_bloom_intensity() -> f32 {
    0.5
}
fn default_white_point() -> f32 {
    11.2
}
fn default_blur_scale() -> f32 {
    1.5
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: default_ssao_radius(),
            intensity: default_ssao_intensity(),
            scale: default_one(),
            bias: default_ssao_bias(),
        }
    }
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: default_bloom_intensity(),
            scene_glow: true,
        }
    }
}

impl Default for ToneMapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            white_point: default_white_point(),
        }
    }
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            blur_scale: default_blur_scale(),
        }
    }
}

impl Default for FxaaSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// One filter in the stack and its static parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEffect {
    pub name: &'static str,
    pub enabled: bool,
    pub params: Vec<(&'static str, ParamValue)>,
}

/// The ordered filter stack: SSAO, bloom, tone map, depth of field, FXAA.
#[derive(Debug, Clone)]
pub struct PostStack {
    effects: Vec<PostEffect>,
}

impl PostStack {
    pub fn from_settings(settings: &PostSettings) -> Self {
        let s = settings;
        let effects = vec![
            PostEffect {
                name: SSAO,
                enabled: s.ssao.enabled,
                params: vec![
                    ("radius", ParamValue::Float(s.ssao.radius)),
                    ("intensity", ParamValue::Float(s.ssao.intensity)),
                    ("scale", ParamValue::Float(s.ssao.scale)),
                    ("bias", ParamValue::Float(s.ssao.bias)),
                ],
            },
            PostEffect {
                name: BLOOM,
                enabled: s.bloom.enabled,
                params: vec![
                    ("intensity", ParamValue::Float(s.bloom.intensity)),
                    ("scene_glow", ParamValue::Bool(s.bloom.scene_glow)),
                ],
            },
            PostEffect {
                name: TONE_MAP,
                enabled: s.tone_map.enabled,
                params: vec![("white_point", ParamValue::Float(s.tone_map.white_point))],
            },
            PostEffect {
                name: DEPTH_OF_FIELD,
                enabled: s.depth_of_field.enabled,
                params: vec![("blur_scale", ParamValue::Float(s.depth_of_field.blur_scale))],
            },
            PostEffect {
                name: FXAA,
                enabled: s.fxaa.enabled,
                params: Vec::new(),
            },
        ];
        Self { effects }
    }

    pub fn effects(&self) -> &[PostEffect] {
        &self.effects
    }

    pub fn get(&self, name: &str) -> Option<&PostEffect> {
        self.effects.iter().find(|e| e.name == name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).map(|e| e.enabled).unwrap_or(false)
    }

    /// Push every effect's enable flag and parameters.
    pub fn apply_all(&self, renderer: &mut dyn Renderer) {
        for effect in &self.effects {
            Self::apply(effect, renderer);
        }
    }

    fn apply(effect: &PostEffect, renderer: &mut dyn Renderer) {
        renderer.set_post_effect_parameter(effect.name, "enabled", ParamValue::Bool(effect.enabled));
        for (param, value) in &effect.params {
            renderer.set_post_effect_parameter(effect.name, param, *value);
        }
    }

    /// Set an effect's enable flag and re-push it. Returns `None` for an
    /// unknown effect.
    pub fn set_enabled(&mut self, name: &str, enabled: bool, renderer: &mut dyn Renderer) -> Option<bool> {
        let effect = self.effects.iter_mut().find(|e| e.name == name)?;
        effect.enabled = enabled;
        Self::apply(effect, renderer);
        tracing::info!("Post effect '{}' {}", name, if enabled { "enabled" } else { "disabled" });
        Some(enabled)
    }

    /// Flip an effect's enable flag. Returns the new state.
    pub fn toggle(&mut self, name: &str, renderer: &mut dyn Renderer) -> Option<bool> {
        let enabled = !self.get(name)?.enabled;
        self.set_enabled(name, enabled, renderer)
    }

    /// Per-frame depth-of-field update from the auto-focus.
    pub fn push_focus(&self, focus: FocusState, renderer: &mut dyn Renderer) {
        if !self.is_enabled(DEPTH_OF_FIELD) {
            return;
        }
        renderer.set_post_effect_parameter(DEPTH_OF_FIELD, "focus_distance", ParamValue::Float(focus.distance));
        renderer.set_post_effect_parameter(DEPTH_OF_FIELD, "focus_range", ParamValue::Float(focus.range));
    }
}
