//! Capabilities the core consumes from external collaborators.
//!
//! The physics engine, renderer and audio backend live in `bunker-client`;
//! the core only ever talks to them through these traits.

use glam::{Quat, Vec3};

use crate::lights::{Light, LightId, ShadowTechnique};
use crate::scene::{Geometry, Transform};

/// The physics character capsule. Collision response, gravity and grounded
/// detection are the implementor's job. Positions are the character's feet.
pub trait CharacterBody {
    fn warp(&mut self, position: Vec3);
    /// Desired horizontal velocity in world units per second.
    fn set_walk_direction(&mut self, velocity: Vec3);
    /// Jump if grounded; ignored otherwise.
    fn jump(&mut self);
    fn set_view_direction(&mut self, direction: Vec3);
    fn is_grounded(&self) -> bool;
    fn world_position(&self) -> Vec3;
}

/// Ray queries against the static scene. `direction` need not be normalized;
/// the returned distance is measured in world units along it.
pub trait SceneRaycast {
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<f32>;
}

/// Physics world driven once per frame.
pub trait PhysicsBackend: CharacterBody + SceneRaycast {
    fn step(&mut self, dt: f32);
}

/// A post-effect parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    Vec3(Vec3),
}

/// Render-side sink for everything the simulation parameterizes.
pub trait Renderer {
    fn set_camera_transform(&mut self, position: Vec3, orientation: Quat);
    fn set_post_effect_parameter(&mut self, effect: &str, name: &str, value: ParamValue);
    /// Add a light to the global light list.
    fn register_light(&mut self, light: &Light);
    fn register_shadow_caster(&mut self, light: LightId, technique: ShadowTechnique);
    /// Drop every registered light and shadow caster.
    fn clear_lights(&mut self);
    /// Hand over a renderable with its prepared material, in world space.
    fn register_geometry(&mut self, node: &str, world: &Transform, geometry: &Geometry);
    fn clear_geometry(&mut self);
    /// Perspective frustum: vertical field of view in degrees and clip planes.
    fn set_projection(&mut self, fov_degrees: f32, near: f32, far: f32);
    fn set_ambient_light(&mut self, color: Vec3);
    fn set_fullscreen(&mut self, fullscreen: bool);
}

/// Audio backend parameters.
pub trait AudioOut {
    /// Volume in `0.0..=1.0`.
    fn set_master_volume(&mut self, volume: f32);
    fn set_listener(&mut self, position: Vec3, orientation: Quat);
}
