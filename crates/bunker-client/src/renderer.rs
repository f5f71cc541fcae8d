//! Render-side sink. Drawing is done by an external renderer; this keeps the
//! latest parameter set the simulation handed over and applies the bits that
//! belong to the window itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use winit::window::{Fullscreen, Window};

use bunker_core::capability::{ParamValue, Renderer};
use bunker_core::lights::{Light, LightId, ShadowTechnique};
use bunker_core::scene::{Geometry, Transform};

/// Perspective frustum handed over at setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

/// A renderable placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub node: String,
    pub world: Transform,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub camera_position: Vec3,
    pub camera_rotation: Quat,
    pub post: BTreeMap<(String, String), ParamValue>,
    pub lights: Vec<Light>,
    pub shadow_casters: Vec<(LightId, ShadowTechnique)>,
    pub renderables: Vec<Renderable>,
    pub projection: Option<Projection>,
    pub ambient_light: Vec3,
    pub fullscreen: bool,
    pub camera_updates: u64,
}

impl RenderState {
    pub fn post_param(&self, effect: &str, name: &str) -> Option<ParamValue> {
        self.post.get(&(effect.to_string(), name.to_string())).copied()
    }

    /// Total depth passes per frame across all shadow casters.
    pub fn shadow_passes(&self) -> u32 {
        self.shadow_casters.iter().map(|(_, t)| t.passes()).sum()
    }
}

pub struct SceneRenderer {
    state: RenderState,
    window: Option<Arc<Window>>,
}

impl SceneRenderer {
    pub fn new(window: Option<Arc<Window>>) -> Self {
        Self {
            state: RenderState::default(),
            window,
        }
    }

    /// Sink with no window, for headless runs.
    pub fn headless() -> Self {
        Self::new(None)
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }
}

impl Renderer for SceneRenderer {
    fn set_camera_transform(&mut self, position: Vec3, orientation: Quat) {
        self.state.camera_position = position;
        self.state.camera_rotation = orientation;
        self.state.camera_updates += 1;
    }

    fn set_post_effect_parameter(&mut self, effect: &str, name: &str, value: ParamValue) {
        tracing::trace!("post {}.{} = {:?}", effect, name, value);
        self.state
            .post
            .insert((effect.to_string(), name.to_string()), value);
    }

    fn register_light(&mut self, light: &Light) {
        self.state.lights.push(light.clone());
    }

    fn register_shadow_caster(&mut self, light: LightId, technique: ShadowTechnique) {
        self.state.shadow_casters.push((light, technique));
        tracing::debug!(
            "Shadow passes per frame: {}",
            self.state.shadow_passes()
        );
    }

    fn clear_lights(&mut self) {
        self.state.lights.clear();
        self.state.shadow_casters.clear();
    }

    fn register_geometry(&mut self, node: &str, world: &Transform, geometry: &Geometry) {
        self.state.renderables.push(Renderable {
            node: node.to_string(),
            world: *world,
            geometry: geometry.clone(),
        });
    }

    fn clear_geometry(&mut self) {
        self.state.renderables.clear();
    }

    fn set_projection(&mut self, fov_degrees: f32, near: f32, far: f32) {
        tracing::debug!("Projection: fov {} near {} far {}", fov_degrees, near, far);
        self.state.projection = Some(Projection { fov_degrees, near, far });
    }

    fn set_ambient_light(&mut self, color: Vec3) {
        self.state.ambient_light = color;
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.state.fullscreen = fullscreen;
        if let Some(window) = &self.window {
            window.set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
        }
    }
}
