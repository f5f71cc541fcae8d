//! The per-frame simulation driver.
//!
//! `Simulation` owns every piece of hot-path state (orientation, focus, light
//! registry, objective) plus boxed handles to the physics, renderer and audio
//! collaborators. Nothing outside the simulation thread touches it; the UI
//! reaches in only through [`Simulation::command_queue`].

use glam::Vec3;
use serde::Serialize;

use crate::camera::CameraRig;
use crate::capability::{AudioOut, CharacterBody, PhysicsBackend, Renderer};
use crate::command::{CommandQueue, DrainReport};
use crate::config::BunkerConfig;
use crate::error::{SceneError, SetupError};
use crate::focus::FocusEstimator;
use crate::input::InputAction;
use crate::lights::LightRegistry;
use crate::locomotion::LocomotionController;
use crate::objective::{ExitZone, HudUpdate, Objective};
use crate::post::PostStack;
use crate::scene::Scene;
use crate::ui::{MenuScreen, UiState};

/// Longest frame step the simulation will take.
pub const MAX_FRAME_DT: f32 = 0.1;

/// External collaborators handed to the simulation at construction.
pub struct Collaborators {
    pub physics: Box<dyn PhysicsBackend>,
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioOut>,
}

/// Point-in-time copy of simulation state for the UI or headless output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub frame: u64,
    pub elapsed: f32,
    pub position: [f32; 3],
    pub camera: [f32; 3],
    pub body_yaw: f32,
    pub head_pitch: f32,
    pub grounded: bool,
    pub walk: [f32; 3],
    pub focus_distance: f32,
    pub focus_range: f32,
    pub lights: usize,
    pub shadow_casters: usize,
    pub cursor_visible: bool,
    pub seconds: u32,
    pub exited: bool,
}

pub struct Simulation {
    config: BunkerConfig,
    physics: Box<dyn PhysicsBackend>,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioOut>,
    camera: CameraRig,
    locomotion: LocomotionController,
    focus: FocusEstimator,
    lights: LightRegistry,
    post: PostStack,
    objective: Objective,
    scene_name: Option<String>,
    commands: CommandQueue<Simulation>,
    ui: CommandQueue<UiState>,
    cursor_visible: bool,
    fullscreen: bool,
    master_volume: f32,
    exit_requested: bool,
    frame: u64,
    elapsed: f32,
}

impl Simulation {
    /// `ui` is the UI thread's queue; HUD and menu updates are posted there.
    pub fn new(config: BunkerConfig, collaborators: Collaborators, ui: CommandQueue<UiState>) -> Self {
        let camera = CameraRig::new(
            config.camera.sensitivity,
            config.camera.max_pitch_radians(),
            config.player.eye_height,
        );
        let locomotion = LocomotionController::new(config.player.walk_speed);
        let focus = FocusEstimator::new(config.focus.clone());
        let lights = LightRegistry::new(config.shadows.clone());
        let post = PostStack::from_settings(&config.post);
        let master_volume = config.audio.master_volume.clamp(0.0, 1.0);

        Self {
            config,
            physics: collaborators.physics,
            renderer: collaborators.renderer,
            audio: collaborators.audio,
            camera,
            locomotion,
            focus,
            lights,
            post,
            objective: Objective::default(),
            scene_name: None,
            commands: CommandQueue::new("sim"),
            ui,
            cursor_visible: true,
            fullscreen: false,
            master_volume,
            exit_requested: false,
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Bring a loaded scene live: materials, lights, post stack, audio and the
    /// player spawn. Calling it again reloads without duplicating lights.
    pub fn setup(&mut self, mut scene: Scene) -> Result<(), SetupError> {
        let spawn = scene
            .spawn
            .or(self.config.player.spawn.map(Vec3::from))
            .ok_or_else(|| SceneError::MissingSpawn(scene.name.clone()))?;

        scene.prepare_materials();
        self.renderer.clear_geometry();
        for (node, world, geometry) in scene.geometries() {
            self.renderer.register_geometry(&node, &world, &geometry);
        }
        self.renderer.set_ambient_light(scene.ambient_light);
        let camera = &self.config.camera;
        self.renderer
            .set_projection(camera.fov_degrees, camera.near, camera.far);
        self.lights.extract(&scene, self.renderer.as_mut());
        self.post.apply_all(self.renderer.as_mut());
        self.audio.set_master_volume(self.master_volume);
        self.renderer.set_fullscreen(self.fullscreen);

        self.physics.warp(spawn);
        self.locomotion.clear_intent();
        self.objective = Objective::new(scene.exit_zone.map(ExitZone::from));
        self.camera.sync(self.physics.world_position());

        tracing::info!(
            "Scene '{}' ready: spawn {:?}, {} lights, exit zone {}",
            scene.name,
            spawn,
            self.lights.len(),
            if self.objective.zone().is_some() { "present" } else { "absent" }
        );
        self.scene_name = Some(scene.name);
        Ok(())
    }

    /// Handle for producers on other threads.
    pub fn command_queue(&self) -> CommandQueue<Simulation> {
        self.commands.clone()
    }

    pub fn ui_queue(&self) -> &CommandQueue<UiState> {
        &self.ui
    }

    /// Single input entry point. Unknown actions are ignored.
    pub fn handle_input_event(&mut self, action: &str, value: f32, pressed: bool) {
        let Some(action) = InputAction::from_name(action) else {
            tracing::trace!("Ignoring unmapped input action '{}'", action);
            return;
        };

        if action == InputAction::ToggleMenu {
            if pressed {
                self.set_cursor_visible(!self.cursor_visible);
            }
            return;
        }

        if self.cursor_visible {
            // Menu open: releases still land so nothing sticks, everything else is dropped.
            if action.is_movement() && !pressed {
                self.set_movement_flag(action, false);
            }
            return;
        }

        match action {
            InputAction::LookX => self.camera.apply_yaw(-value, self.physics.as_mut()),
            InputAction::LookY => self.camera.apply_pitch(value),
            InputAction::Jump => {
                if pressed {
                    self.locomotion.request_jump(self.physics.as_mut());
                }
            }
            InputAction::ExitDoor => {
                if pressed {
                    if let Some(updates) = self.objective.try_exit(self.camera.position()) {
                        self.post_hud(updates);
                    }
                }
            }
            InputAction::MoveForward
            | InputAction::MoveBack
            | InputAction::StrafeLeft
            | InputAction::StrafeRight => self.set_movement_flag(action, pressed),
            InputAction::ToggleMenu => {}
        }
    }

    fn set_movement_flag(&mut self, action: InputAction, pressed: bool) {
        let intent = self.locomotion.intent_mut();
        match action {
            InputAction::MoveForward => intent.forward = pressed,
            InputAction::MoveBack => intent.back = pressed,
            InputAction::StrafeLeft => intent.left = pressed,
            InputAction::StrafeRight => intent.right = pressed,
            _ => {}
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) -> DrainReport {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

        let queue = self.commands.clone();
        let report = queue.drain_and_execute_all(self);

        self.physics.step(dt);
        self.locomotion.tick(&self.camera.orientation(), self.physics.as_mut());
        self.camera.sync(self.physics.world_position());

        let focus = self
            .focus
            .tick(self.camera.position(), self.camera.direction(), self.physics.as_ref(), dt);

        let updates = self.objective.update(self.camera.position(), dt);
        self.post_hud(updates);

        self.renderer
            .set_camera_transform(self.camera.position(), self.camera.rotation());
        self.post.push_focus(focus, self.renderer.as_mut());
        self.audio.set_listener(self.camera.position(), self.camera.rotation());

        self.frame += 1;
        self.elapsed += dt;
        report
    }

    fn post_hud(&self, updates: Vec<HudUpdate>) {
        if updates.is_empty() {
            return;
        }
        self.ui.enqueue(move |ui: &mut UiState| {
            for update in &updates {
                ui.hud.apply(update);
            }
            Ok(())
        });
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Showing the cursor opens the menu and drops any held movement keys.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor_visible == visible {
            return;
        }
        self.cursor_visible = visible;
        if visible {
            self.locomotion.clear_intent();
            self.ui.enqueue(|ui: &mut UiState| {
                ui.screen = MenuScreen::Main;
                Ok(())
            });
        } else {
            self.ui.enqueue(|ui: &mut UiState| {
                ui.screen = MenuScreen::Hidden;
                Ok(())
            });
        }
        tracing::debug!("Cursor {}", if visible { "shown" } else { "hidden" });
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.audio.set_master_volume(self.master_volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        self.renderer.set_fullscreen(fullscreen);
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Flip a post effect. `None` for an unknown effect name.
    pub fn toggle_post_effect(&mut self, effect: &str) -> Option<bool> {
        self.post.toggle(effect, self.renderer.as_mut())
    }

    /// Teleport the player by `offset` from where it stands.
    pub fn nudge_player(&mut self, offset: Vec3) {
        let position = self.physics.world_position() + offset;
        self.physics.warp(position);
    }

    pub fn request_exit(&mut self) {
        tracing::info!("Exit requested");
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn focus(&self) -> &FocusEstimator {
        &self.focus
    }

    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn config(&self) -> &BunkerConfig {
        &self.config
    }

    pub fn scene_name(&self) -> Option<&str> {
        self.scene_name.as_deref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let orientation = self.camera.orientation();
        let focus = self.focus.state();
        SimSnapshot {
            frame: self.frame,
            elapsed: self.elapsed,
            position: self.physics.world_position().to_array(),
            camera: self.camera.position().to_array(),
            body_yaw: orientation.body_yaw,
            head_pitch: orientation.head_pitch,
            grounded: self.physics.is_grounded(),
            walk: self.locomotion.last_walk().to_array(),
            focus_distance: focus.distance,
            focus_range: focus.range,
            lights: self.lights.len(),
            shadow_casters: self.lights.shadow_caster_count(),
            cursor_visible: self.cursor_visible,
            seconds: self.objective.timer().seconds(),
            exited: self.objective.exited(),
        }
    }
}
