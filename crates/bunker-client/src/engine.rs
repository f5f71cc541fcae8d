//! Window mode: the winit application loop driving the simulation, plus the
//! wiring shared with the headless runner.

use std::sync::Arc;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{CursorGrabMode, Window, WindowId};

use bunker_core::capability::Renderer;
use bunker_core::command::CommandQueue;
use bunker_core::error::SetupError;
use bunker_core::simulation::{Collaborators, Simulation, MAX_FRAME_DT};
use bunker_core::ui::UiState;

use crate::audio::AudioSystem;
use crate::input::InputMapper;
use crate::menu::UiThread;
use crate::physics::PhysicsWorld;
use crate::project::Project;
use crate::renderer::SceneRenderer;

/// Load the scene, build physics around it and bring the simulation live.
pub fn build_simulation(
    project: &Project,
    renderer: Box<dyn Renderer>,
    mut audio: AudioSystem,
    ui_queue: CommandQueue<UiState>,
) -> Result<Simulation, SetupError> {
    let scene = project.load_scene()?;
    let physics = PhysicsWorld::from_scene(&scene, &project.config.player)?;

    if let Some(ambient) = &project.config.audio.ambient {
        if let Err(e) = audio.play_ambient(&project.root, ambient) {
            tracing::warn!("{}", e);
        }
    }

    let mut sim = Simulation::new(
        project.config.clone(),
        Collaborators {
            physics: Box::new(physics),
            renderer,
            audio: Box::new(audio),
        },
        ui_queue,
    );
    sim.setup(scene)?;
    Ok(sim)
}

pub struct Engine {
    project: Project,
    read_stdin: bool,
    window: Option<Arc<Window>>,
    sim: Option<Simulation>,
    input: InputMapper,
    ui_thread: Option<UiThread>,
    last_frame_time: Option<Instant>,
    cursor_visible: Option<bool>,
    error: Option<SetupError>,
}

impl Engine {
    pub fn new(project: Project, read_stdin: bool) -> Self {
        let input = InputMapper::new(&project.bindings());
        Self {
            project,
            read_stdin,
            window: None,
            sim: None,
            input,
            ui_thread: None,
            last_frame_time: None,
            cursor_visible: None,
            error: None,
        }
    }

    /// Setup failure that ended the loop, if any.
    pub fn take_error(&mut self) -> Option<SetupError> {
        self.error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SetupError> {
        let window_attrs = Window::default_attributes()
            .with_title("bunker")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| SetupError::Window(e.to_string()))?,
        );

        let ui_queue = CommandQueue::new("ui");
        let renderer = Box::new(SceneRenderer::new(Some(Arc::clone(&window))));
        let sim = build_simulation(&self.project, renderer, AudioSystem::new(), ui_queue.clone())?;

        let ui_thread = UiThread::spawn(sim.command_queue(), ui_queue, self.read_stdin)
            .map_err(|e| SetupError::Window(format!("UI thread: {}", e)))?;

        self.window = Some(window);
        self.sim = Some(sim);
        self.ui_thread = Some(ui_thread);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SetupError) {
        tracing::error!("{}", error);
        self.error = Some(error);
        self.stop(event_loop);
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut ui) = self.ui_thread.take() {
            ui.shutdown();
        }
        event_loop.exit();
    }

    /// Mirror the simulation's cursor flag onto the window.
    fn sync_cursor(&mut self) {
        let (Some(window), Some(sim)) = (&self.window, &self.sim) else {
            return;
        };
        let visible = sim.cursor_visible();
        if self.cursor_visible == Some(visible) {
            return;
        }
        self.cursor_visible = Some(visible);

        if visible {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                tracing::debug!("Cursor release failed: {}", e);
            }
        } else {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("Cursor grab failed: {}", e);
            }
        }
        window.set_cursor_visible(visible);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map(|last| now.duration_since(last).as_secs_f32().min(MAX_FRAME_DT))
            .unwrap_or(1.0 / 60.0);
        self.last_frame_time = Some(now);

        let Some(sim) = &mut self.sim else {
            return;
        };
        let report = sim.tick(dt);
        if report.failed > 0 {
            tracing::debug!("{} of {} commands failed this frame", report.failed, report.executed);
        }

        let ui_gone = self.ui_thread.as_ref().map(UiThread::is_finished).unwrap_or(false);
        if sim.exit_requested() || ui_gone {
            tracing::info!("Shutting down after {} frames", sim.frame());
            self.stop(event_loop);
            return;
        }
        self.sync_cursor();
    }
}

impl ApplicationHandler for Engine {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        tracing::info!("Application resumed, loading {}", self.project.scene_path.display());

        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        self.sync_cursor();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let Some(sim) = &mut self.sim {
            for input in self.input.handle_window_event(&event) {
                sim.handle_input_event(&input.action, input.value, input.pressed);
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                self.stop(event_loop);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(sim) = &mut self.sim {
            for input in self.input.handle_device_event(&event) {
                sim.handle_input_event(&input.action, input.value, input.pressed);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut ui) = self.ui_thread.take() {
            ui.shutdown();
        }
    }
}
