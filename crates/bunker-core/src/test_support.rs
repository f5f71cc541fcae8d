//! Recording collaborators for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::capability::{AudioOut, CharacterBody, ParamValue, PhysicsBackend, Renderer, SceneRaycast};
use crate::lights::{Light, LightId, ShadowTechnique};
use crate::scene::{Geometry, Transform};

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub camera: Option<(Vec3, Quat)>,
    pub camera_updates: usize,
    pub params: HashMap<(String, String), ParamValue>,
    pub lights: Vec<Light>,
    pub casters: Vec<(LightId, ShadowTechnique)>,
    pub clears: usize,
    pub geometry: Vec<(String, Transform, Geometry)>,
    pub projection: Option<(f32, f32, f32)>,
    pub ambient: Option<Vec3>,
    pub fullscreen: Option<bool>,
}

impl RecordingRenderer {
    pub fn param(&self, effect: &str, name: &str) -> Option<ParamValue> {
        self.params.get(&(effect.to_string(), name.to_string())).copied()
    }

    pub fn float(&self, effect: &str, name: &str) -> Option<f32> {
        match self.param(effect, name) {
            Some(ParamValue::Float(v)) => Some(v),
            _ => None,
        }
    }
}

impl Renderer for RecordingRenderer {
    fn set_camera_transform(&mut self, position: Vec3, orientation: Quat) {
        self.camera = Some((position, orientation));
        self.camera_updates += 1;
    }

    fn set_post_effect_parameter(&mut self, effect: &str, name: &str, value: ParamValue) {
        self.params.insert((effect.to_string(), name.to_string()), value);
    }

    fn register_light(&mut self, light: &Light) {
        self.lights.push(light.clone());
    }

    fn register_shadow_caster(&mut self, light: LightId, technique: ShadowTechnique) {
        self.casters.push((light, technique));
    }

    fn clear_lights(&mut self) {
        self.lights.clear();
        self.casters.clear();
        self.clears += 1;
    }

    fn register_geometry(&mut self, node: &str, world: &Transform, geometry: &Geometry) {
        self.geometry.push((node.to_string(), *world, geometry.clone()));
    }

    fn clear_geometry(&mut self) {
        self.geometry.clear();
    }

    fn set_projection(&mut self, fov_degrees: f32, near: f32, far: f32) {
        self.projection = Some((fov_degrees, near, far));
    }

    fn set_ambient_light(&mut self, color: Vec3) {
        self.ambient = Some(color);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = Some(fullscreen);
    }
}

/// Kinematic stand-in for the physics character: `step` integrates the last
/// walk direction with no collisions.
#[derive(Debug, Default)]
pub struct MockPhysics {
    pub position: Vec3,
    pub walks: Vec<Vec3>,
    pub view_direction: Vec3,
    pub grounded: bool,
    pub jumps: usize,
    pub warps: Vec<Vec3>,
    pub steps: Vec<f32>,
    /// Distance returned by every raycast.
    pub hit_distance: Option<f32>,
    pub rays: Vec<(Vec3, Vec3)>,
}

impl CharacterBody for MockPhysics {
    fn warp(&mut self, position: Vec3) {
        self.position = position;
        self.warps.push(position);
    }

    fn set_walk_direction(&mut self, velocity: Vec3) {
        self.walks.push(velocity);
    }

    fn jump(&mut self) {
        if self.grounded {
            self.jumps += 1;
        }
    }

    fn set_view_direction(&mut self, direction: Vec3) {
        self.view_direction = direction;
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn world_position(&self) -> Vec3 {
        self.position
    }
}

impl SceneRaycast for MockPhysics {
    fn raycast(&self, _origin: Vec3, _direction: Vec3) -> Option<f32> {
        self.hit_distance
    }
}

impl PhysicsBackend for MockPhysics {
    fn step(&mut self, dt: f32) {
        if let Some(walk) = self.walks.last() {
            self.position += *walk * dt;
        }
        self.steps.push(dt);
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub volumes: Vec<f32>,
    pub listener: Option<(Vec3, Quat)>,
}

impl AudioOut for RecordingAudio {
    fn set_master_volume(&mut self, volume: f32) {
        self.volumes.push(volume);
    }

    fn set_listener(&mut self, position: Vec3, orientation: Quat) {
        self.listener = Some((position, orientation));
    }
}

// Shared handles so a test can inspect a collaborator after handing it to
// the simulation as a boxed trait object.

impl Renderer for Rc<RefCell<RecordingRenderer>> {
    fn set_camera_transform(&mut self, position: Vec3, orientation: Quat) {
        self.borrow_mut().set_camera_transform(position, orientation)
    }
    fn set_post_effect_parameter(&mut self, effect: &str, name: &str, value: ParamValue) {
        self.borrow_mut().set_post_effect_parameter(effect, name, value)
    }
    fn register_light(&mut self, light: &Light) {
        self.borrow_mut().register_light(light)
    }
    fn register_shadow_caster(&mut self, light: LightId, technique: ShadowTechnique) {
        self.borrow_mut().register_shadow_caster(light, technique)
    }
    fn clear_lights(&mut self) {
        self.borrow_mut().clear_lights()
    }
    fn register_geometry(&mut self, node: &str, world: &Transform, geometry: &Geometry) {
        self.borrow_mut().register_geometry(node, world, geometry)
    }
    fn clear_geometry(&mut self) {
        self.borrow_mut().clear_geometry()
    }
    fn set_projection(&mut self, fov_degrees: f32, near: f32, far: f32) {
        self.borrow_mut().set_projection(fov_degrees, near, far)
    }
    fn set_ambient_light(&mut self, color: Vec3) {
        self.borrow_mut().set_ambient_light(color)
    }
    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.borrow_mut().set_fullscreen(fullscreen)
    }
}

impl CharacterBody for Rc<RefCell<MockPhysics>> {
    fn warp(&mut self, position: Vec3) {
        self.borrow_mut().warp(position)
    }
    fn set_walk_direction(&mut self, velocity: Vec3) {
        self.borrow_mut().set_walk_direction(velocity)
    }
    fn jump(&mut self) {
        self.borrow_mut().jump()
    }
    fn set_view_direction(&mut self, direction: Vec3) {
        self.borrow_mut().set_view_direction(direction)
    }
    fn is_grounded(&self) -> bool {
        self.borrow().is_grounded()
    }
    fn world_position(&self) -> Vec3 {
        self.borrow().world_position()
    }
}

impl SceneRaycast for Rc<RefCell<MockPhysics>> {
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut physics = self.borrow_mut();
        physics.rays.push((origin, direction));
        physics.hit_distance
    }
}

impl PhysicsBackend for Rc<RefCell<MockPhysics>> {
    fn step(&mut self, dt: f32) {
        self.borrow_mut().step(dt)
    }
}

impl AudioOut for Rc<RefCell<RecordingAudio>> {
    fn set_master_volume(&mut self, volume: f32) {
        self.borrow_mut().set_master_volume(volume)
    }
    fn set_listener(&mut self, position: Vec3, orientation: Quat) {
        self.borrow_mut().set_listener(position, orientation)
    }
}
