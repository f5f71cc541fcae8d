//! Light discovery and shadow technique assignment.
//!
//! Lights are authored on scene nodes. At load (and on every reload) the
//! registry walks the whole graph, hands every light to the renderer's global
//! light list and picks a shadow technique per kind:
//!
//! | kind        | technique                    | default map |
//! |-------------|------------------------------|-------------|
//! | directional | cascaded shadow map          | 2048, 3 splits |
//! | spot        | single shadow map            | 1024 |
//! | point       | omnidirectional (6 faces)    | 256, capped count |

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::Renderer;
use crate::scene::{Attachment, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Directional,
    Spot,
    Point,
}

impl LightKind {
    pub fn name(&self) -> &'static str {
        match self {
            LightKind::Directional => "directional",
            LightKind::Spot => "spot",
            LightKind::Point => "point",
        }
    }
}

/// A light as attached to a scene node, in node-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub direction: Vec3,
    /// Spot cone angles in radians.
    pub inner_angle: f32,
    pub outer_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub u32);

/// A discovered light in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub id: LightId,
    pub name: String,
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub inner_angle: f32,
    pub outer_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowFiltering {
    Hard,
    Pcf,
    #[default]
    PcfPoisson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowTechnique {
    Cascaded {
        map_size: u32,
        splits: u32,
        filtering: ShadowFiltering,
    },
    SpotMap {
        map_size: u32,
        filtering: ShadowFiltering,
    },
    Omnidirectional {
        map_size: u32,
    },
}

impl ShadowTechnique {
    pub fn name(&self) -> &'static str {
        match self {
            ShadowTechnique::Cascaded { .. } => "cascaded",
            ShadowTechnique::SpotMap { .. } => "spot_map",
            ShadowTechnique::Omnidirectional { .. } => "omni_cube",
        }
    }

    pub fn map_size(&self) -> u32 {
        match self {
            ShadowTechnique::Cascaded { map_size, .. }
            | ShadowTechnique::SpotMap { map_size, .. }
            | ShadowTechnique::Omnidirectional { map_size } => *map_size,
        }
    }

    /// Depth passes rendered per frame for this technique.
    pub fn passes(&self) -> u32 {
        match self {
            ShadowTechnique::Cascaded { splits, .. } => *splits,
            ShadowTechnique::SpotMap { .. } => 1,
            ShadowTechnique::Omnidirectional { .. } => 6,
        }
    }
}

/// Shadow quality per light kind, plus the point-light caster budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShadowSettings {
    #[serde(default = "default_directional_map_size")]
    pub directional_map_size: u32,
    #[serde(default = "default_directional_splits")]
    pub directional_splits: u32,
    #[serde(default = "default_spot_map_size")]
    pub spot_map_size: u32,
    #[serde(default = "default_point_map_size")]
    pub point_map_size: u32,
    #[serde(default = "default_max_point_casters")]
    pub max_point_casters: usize,
    #[serde(default)]
    pub filtering: ShadowFiltering,
}

fn default_directional_map_size() -> u32 {
    2048
}
fn default_directional_splits() -> u32 {
    3
}
fn default_spot_map_size() -> u32 {
    1024
}
fn default_point_map_size() -> u32 {
    256
}
fn default_max_point_casters() -> usize {
    4
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            directional_map_size: default_directional_map_size(),
            directional_splits: default_directional_splits(),
            spot_map_size: default_spot_map_size(),
            point_map_size: default_point_map_size(),
            max_point_casters: default_max_point_casters(),
            filtering: ShadowFiltering::default(),
        }
    }
}

impl ShadowSettings {
    pub fn technique_for(&self, kind: LightKind) -> ShadowTechnique {
        match kind {
            LightKind::Directional => ShadowTechnique::Cascaded {
                map_size: self.directional_map_size,
                splits: self.directional_splits,
                filtering: self.filtering,
            },
            LightKind::Spot => ShadowTechnique::SpotMap {
                map_size: self.spot_map_size,
                filtering: self.filtering,
            },
            LightKind::Point => ShadowTechnique::Omnidirectional {
                map_size: self.point_map_size,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredLight {
    pub light: Light,
    /// `None` when the light is lit but casts no shadow (budget exhausted).
    pub technique: Option<ShadowTechnique>,
}

/// Every light registered with the renderer, owned by the simulation thread.
pub struct LightRegistry {
    settings: ShadowSettings,
    lights: BTreeMap<LightId, RegisteredLight>,
    primary_directional: Option<LightId>,
}

impl LightRegistry {
    pub fn new(settings: ShadowSettings) -> Self {
        Self {
            settings,
            lights: BTreeMap::new(),
            primary_directional: None,
        }
    }

    /// Drop every registration, here and on the renderer.
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        renderer.clear_lights();
        self.lights.clear();
        self.primary_directional = None;
    }

    /// Discover every light in `scene`, register it and its shadow caster.
    /// Previous registrations are cleared first.
    pub fn extract(&mut self, scene: &Scene, renderer: &mut dyn Renderer) -> Vec<Light> {
        self.clear(renderer);

        let mut found = Vec::new();
        scene.visit_breadth_first(|_, node, world| {
            for attachment in &node.attachments {
                if let Attachment::Light(source) = attachment {
                    found.push(Light {
                        id: LightId(found.len() as u32),
                        name: node.name.clone(),
                        kind: source.kind,
                        position: world.position,
                        direction: (world.rotation * source.direction).normalize_or_zero(),
                        color: source.color,
                        intensity: source.intensity,
                        range: source.range,
                        inner_angle: source.inner_angle,
                        outer_angle: source.outer_angle,
                    });
                }
            }
        });

        let mut point_casters = 0;
        for light in &found {
            tracing::info!("Loaded light: {} [{}]", light.name, light.kind.name());
            renderer.register_light(light);

            if light.kind == LightKind::Directional && self.primary_directional.is_none() {
                self.primary_directional = Some(light.id);
            }

            let technique = if light.kind == LightKind::Point {
                if point_casters < self.settings.max_point_casters {
                    point_casters += 1;
                    Some(self.settings.technique_for(light.kind))
                } else {
                    tracing::info!(
                        "Point light '{}' casts no shadow: budget of {} omni casters reached",
                        light.name,
                        self.settings.max_point_casters
                    );
                    None
                }
            } else {
                Some(self.settings.technique_for(light.kind))
            };

            if let Some(technique) = technique {
                tracing::debug!(
                    "Shadow caster for '{}': {} ({}px)",
                    light.name,
                    technique.name(),
                    technique.map_size()
                );
                renderer.register_shadow_caster(light.id, technique);
            }

            self.lights.insert(
                light.id,
                RegisteredLight {
                    light: light.clone(),
                    technique,
                },
            );
        }

        tracing::info!(
            "{} lights registered ({} shadow casters)",
            self.lights.len(),
            self.shadow_caster_count()
        );
        found
    }

    /// The first directional light found, used by single-caster subsystems.
    pub fn primary_directional(&self) -> Option<&Light> {
        self.primary_directional
            .and_then(|id| self.lights.get(&id))
            .map(|r| &r.light)
    }

    pub fn get(&self, id: LightId) -> Option<&RegisteredLight> {
        self.lights.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredLight> {
        self.lights.values()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn shadow_caster_count(&self) -> usize {
        self.lights.values().filter(|r| r.technique.is_some()).count()
    }
}
