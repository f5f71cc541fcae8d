//! rapier3d world holding the static bunker geometry and the player capsule.

use glam::{Quat, Vec3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

use bunker_core::capability::{CharacterBody, PhysicsBackend, SceneRaycast};
use bunker_core::config::PlayerSettings;
use bunker_core::error::SetupError;
use bunker_core::scene::{ColliderShape, Scene, Transform};

/// Longest ray the focus probe may cast.
const MAX_RAY_DISTANCE: f32 = 1000.0;

/// The player capsule driven by a kinematic character controller.
#[derive(Debug, Clone)]
struct Character {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    walk: Vec3,
    view_direction: Vec3,
    vertical_velocity: f32,
    grounded: bool,
    jump_requested: bool,
    jump_speed: f32,
    gravity: f32,
    /// Distance from the capsule centre down to its feet.
    foot_offset: f32,
}

pub struct PhysicsWorld {
    pub gravity: Vec3,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_params: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    controller: KinematicCharacterController,
    character: Option<Character>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        let mut controller = KinematicCharacterController::default();
        controller.max_slope_climb_angle = 45.0_f32.to_radians();
        controller.min_slope_slide_angle = 30.0_f32.to_radians();
        controller.autostep = Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(0.3),
            min_width: CharacterLength::Absolute(0.2),
            include_dynamic_bodies: false,
        });
        controller.snap_to_ground = Some(CharacterLength::Absolute(0.1));

        Self {
            gravity,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_params: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            controller,
            character: None,
        }
    }

    /// Static colliders for every collider node plus the player capsule at
    /// the spawn point.
    pub fn from_scene(scene: &Scene, player: &PlayerSettings) -> Result<Self, SetupError> {
        let spawn = scene
            .spawn
            .or(player.spawn.map(Vec3::from))
            .ok_or_else(|| SetupError::Physics(format!("scene '{}' has no spawn point", scene.name)))?;

        let mut world = PhysicsWorld::new(scene.gravity);
        for (transform, shape) in scene.colliders() {
            world.add_static_collider(&transform, &shape);
        }
        world.spawn_character(spawn, player)?;
        world.query_pipeline.update(&world.collider_set);

        tracing::info!(
            "Physics ready: {} static colliders, character at {:?}",
            world.collider_set.len() - 1,
            spawn
        );
        Ok(world)
    }

    pub fn add_static_collider(&mut self, transform: &Transform, shape: &ColliderShape) -> ColliderHandle {
        let p = transform.position;
        let rb = RigidBodyBuilder::fixed()
            .translation(vector![p.x, p.y, p.z])
            .rotation(quat_to_angvector(transform.rotation))
            .build();
        let rb_handle = self.rigid_body_set.insert(rb);

        let collider = shape_to_collider(shape, transform.scale).friction(0.5).build();
        self.collider_set
            .insert_with_parent(collider, rb_handle, &mut self.rigid_body_set)
    }

    /// Capsule of `player.height` total height and `player.radius`, standing
    /// with its feet at `position`.
    pub fn spawn_character(&mut self, position: Vec3, player: &PlayerSettings) -> Result<(), SetupError> {
        if player.radius <= 0.0 || player.height < player.radius * 2.0 {
            return Err(SetupError::Physics(format!(
                "invalid capsule: radius {} height {}",
                player.radius, player.height
            )));
        }
        let half_height = (player.height - 2.0 * player.radius) * 0.5;
        let foot_offset = player.height * 0.5;

        let rb = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y + foot_offset, position.z])
            .build();
        let body = self.rigid_body_set.insert(rb);
        let collider = ColliderBuilder::capsule_y(half_height, player.radius).build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);

        self.character = Some(Character {
            body,
            collider,
            walk: Vec3::ZERO,
            view_direction: Vec3::Z,
            vertical_velocity: 0.0,
            grounded: false,
            jump_requested: false,
            jump_speed: player.jump_speed,
            gravity: player.gravity,
            foot_offset,
        });
        Ok(())
    }

    pub fn view_direction(&self) -> Vec3 {
        self.character.as_ref().map(|c| c.view_direction).unwrap_or(Vec3::Z)
    }

    /// Move the capsule by the walk velocity plus its own gravity and jump.
    fn move_character(&mut self, dt: f32) {
        let Some(character) = self.character.as_mut() else {
            return;
        };

        let mut vel_y = character.vertical_velocity;
        if character.grounded {
            vel_y = 0.0;
            if character.jump_requested {
                vel_y = character.jump_speed;
            }
        }
        character.jump_requested = false;
        vel_y += character.gravity * dt;

        let desired = Vec3::new(character.walk.x * dt, vel_y * dt, character.walk.z * dt);

        let body = &self.rigid_body_set[character.body];
        let collider = &self.collider_set[character.collider];
        let movement = self.controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            collider.shape(),
            body.position(),
            vector![desired.x, desired.y, desired.z],
            QueryFilter::default().exclude_rigid_body(character.body),
            |_| {},
        );

        let mut next = *body.position();
        next.translation.vector += movement.translation;
        if let Some(body) = self.rigid_body_set.get_mut(character.body) {
            body.set_next_kinematic_position(next);
        }

        character.grounded = movement.grounded;
        character.vertical_velocity = if movement.grounded && vel_y < 0.0 { 0.0 } else { vel_y };
    }
}

impl CharacterBody for PhysicsWorld {
    fn warp(&mut self, position: Vec3) {
        let Some(character) = self.character.as_mut() else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(character.body) {
            let iso = Isometry::translation(position.x, position.y + character.foot_offset, position.z);
            body.set_position(iso, true);
            body.set_next_kinematic_position(iso);
        }
        character.vertical_velocity = 0.0;
        character.grounded = false;
    }

    fn set_walk_direction(&mut self, velocity: Vec3) {
        if let Some(character) = self.character.as_mut() {
            character.walk = Vec3::new(velocity.x, 0.0, velocity.z);
        }
    }

    fn jump(&mut self) {
        if let Some(character) = self.character.as_mut() {
            if character.grounded {
                character.jump_requested = true;
            }
        }
    }

    fn set_view_direction(&mut self, direction: Vec3) {
        if let Some(character) = self.character.as_mut() {
            character.view_direction = direction.normalize_or_zero();
        }
    }

    fn is_grounded(&self) -> bool {
        self.character.as_ref().map(|c| c.grounded).unwrap_or(false)
    }

    /// Position of the character's feet.
    fn world_position(&self) -> Vec3 {
        self.character
            .as_ref()
            .and_then(|c| {
                self.rigid_body_set.get(c.body).map(|body| {
                    let t = body.position().translation;
                    Vec3::new(t.x, t.y - c.foot_offset, t.z)
                })
            })
            .unwrap_or(Vec3::ZERO)
    }
}

impl SceneRaycast for PhysicsWorld {
    /// Nearest hit against static geometry; the player capsule is never hit.
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let ray = Ray::new(point![origin.x, origin.y, origin.z], vector![dir.x, dir.y, dir.z]);

        let filter = match &self.character {
            Some(character) => QueryFilter::default().exclude_rigid_body(character.body),
            None => QueryFilter::default(),
        };

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                MAX_RAY_DISTANCE,
                true,
                filter,
            )
            .map(|(_, toi)| toi)
    }
}

impl PhysicsBackend for PhysicsWorld {
    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.move_character(dt);

        self.integration_params.dt = dt;
        let gravity = vector![self.gravity.x, self.gravity.y, self.gravity.z];
        self.physics_pipeline.step(
            &gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

fn shape_to_collider(shape: &ColliderShape, scale: Vec3) -> ColliderBuilder {
    let scale = scale.abs();
    match shape {
        ColliderShape::Box { half_extents } => {
            let h = *half_extents * scale;
            ColliderBuilder::cuboid(h.x, h.y, h.z)
        }
        ColliderShape::Sphere { radius } => ColliderBuilder::ball(radius * scale.max_element()),
        ColliderShape::Capsule { half_height, radius } => {
            ColliderBuilder::capsule_y(half_height * scale.y, radius * scale.x.max(scale.z))
        }
    }
}

fn quat_to_angvector(q: Quat) -> rapier3d::na::Vector3<f32> {
    let (axis, angle) = q.to_axis_angle();
    vector![axis.x * angle, axis.y * angle, axis.z * angle]
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn floor_world(spawn: Vec3) -> PhysicsWorld {
        let mut scene = Scene::new("floor");
        scene.spawn = Some(spawn);
        let floor = scene.add_node(scene.root(), "floor", Transform::from_position(Vec3::new(0.0, -0.5, 0.0)));
        scene.attach(
            floor,
            bunker_core::scene::Attachment::Collider(ColliderShape::Box {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            }),
        );
        let wall = scene.add_node(scene.root(), "wall", Transform::from_position(Vec3::new(0.0, 5.0, 20.0)));
        scene.attach(
            wall,
            bunker_core::scene::Attachment::Collider(ColliderShape::Box {
                half_extents: Vec3::new(10.0, 5.0, 0.5),
            }),
        );
        PhysicsWorld::from_scene(&scene, &PlayerSettings::default()).unwrap()
    }

    fn settle(world: &mut PhysicsWorld) {
        for _ in 0..180 {
            world.step(DT);
        }
    }

    #[test]
    fn test_from_scene_builds_colliders() {
        let world = floor_world(Vec3::new(0.0, 3.0, 0.0));
        // Two statics plus the capsule.
        assert_eq!(world.collider_set.len(), 3);
        assert!((world.world_position() - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_missing_spawn_is_error() {
        let scene = Scene::new("void");
        assert!(PhysicsWorld::from_scene(&scene, &PlayerSettings::default()).is_err());
    }

    #[test]
    fn test_character_lands_on_floor() {
        let mut world = floor_world(Vec3::new(0.0, 4.0, 0.0));
        assert!(!world.is_grounded());
        settle(&mut world);

        assert!(world.is_grounded());
        // Feet rest on the floor; the capsule centre is half its height up.
        let y = world.world_position().y;
        assert!(y.abs() < 0.2, "y = {}", y);
        let centre = world.rigid_body_set[world.character.as_ref().unwrap().body].translation().y;
        assert!((centre - 2.75).abs() < 0.2, "centre = {}", centre);
    }

    #[test]
    fn test_settled_eye_height_above_floor() {
        let player = PlayerSettings::default();
        let mut world = floor_world(Vec3::new(0.0, 1.0, 0.0));
        settle(&mut world);

        let mut rig = bunker_core::camera::CameraRig::new(0.002, 85.0_f32.to_radians(), player.eye_height);
        rig.sync(world.world_position());
        assert!((rig.position().y - player.eye_height).abs() < 0.2, "eye = {}", rig.position().y);
        // Below the top of the capsule.
        assert!(rig.position().y < player.height);
    }

    #[test]
    fn test_walk_moves_horizontally() {
        let mut world = floor_world(Vec3::new(0.0, 3.0, 0.0));
        settle(&mut world);
        let start = world.world_position();

        world.set_walk_direction(Vec3::new(0.0, 0.0, 5.0));
        for _ in 0..60 {
            world.step(DT);
        }
        let moved = world.world_position() - start;
        assert!(moved.z > 3.5 && moved.z < 5.5, "moved {:?}", moved);
        assert!(moved.x.abs() < 0.1);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut world = floor_world(Vec3::new(0.0, 10.0, 0.0));
        world.jump();
        world.step(DT);
        assert!(world.world_position().y < 10.0);

        settle(&mut world);
        let rest = world.world_position().y;
        world.jump();
        for _ in 0..10 {
            world.step(DT);
        }
        assert!(world.world_position().y > rest + 0.3);
    }

    #[test]
    fn test_raycast_ignores_character() {
        let mut world = floor_world(Vec3::new(0.0, 3.0, 0.0));
        settle(&mut world);
        let eye = world.world_position() + Vec3::new(0.0, 5.3, 0.0);

        let hit = world.raycast(eye, Vec3::Z).unwrap();
        assert!((hit - 19.5).abs() < 0.01, "hit = {}", hit);

        let down = world.raycast(eye, Vec3::NEG_Y).unwrap();
        assert!(down > 4.0);

        assert!(world.raycast(eye, Vec3::Y).is_none());
        assert!(world.raycast(eye, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_warp_teleports() {
        let mut world = floor_world(Vec3::new(0.0, 3.0, 0.0));
        settle(&mut world);
        world.warp(Vec3::new(5.0, 8.0, -3.0));
        assert!((world.world_position() - Vec3::new(5.0, 8.0, -3.0)).length() < 1e-5);
        assert!(!world.is_grounded());
    }
}
