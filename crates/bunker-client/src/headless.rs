//! Headless mode: a fixed number of 1/60 s frames with no window or audio
//! device, printing a JSON snapshot for every simulated second.

use bunker_core::command::CommandQueue;
use bunker_core::error::SetupError;
use bunker_core::simulation::SimSnapshot;
use bunker_core::ui::UiState;

use crate::audio::AudioSystem;
use crate::engine::build_simulation;
use crate::project::Project;
use crate::renderer::SceneRenderer;

pub const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES_PER_SECOND: u64 = 60;

#[derive(Debug, Default)]
pub struct HeadlessReport {
    pub snapshots: Vec<SimSnapshot>,
    /// Every distinct HUD state seen, in order.
    pub hud: Vec<Vec<String>>,
    pub exited_early: bool,
}

/// Run `frames` frames. The UI model lives on this thread and is drained
/// once per frame.
pub fn run_headless(project: &Project, frames: u64) -> Result<HeadlessReport, SetupError> {
    let ui_queue = CommandQueue::new("ui");
    let mut sim = build_simulation(
        project,
        Box::new(SceneRenderer::headless()),
        AudioSystem::disabled(),
        ui_queue.clone(),
    )?;
    let mut ui = UiState::new(sim.command_queue());
    // Playing, not in the menu.
    sim.set_cursor_visible(false);

    let mut report = HeadlessReport::default();
    tracing::info!("Headless run: {} frames", frames);

    for frame in 1..=frames {
        sim.tick(FRAME_DT);
        ui_queue.drain_and_execute_all(&mut ui);

        let hud = ui.hud.lines();
        if report.hud.last() != Some(&hud) {
            if !hud.is_empty() {
                tracing::info!("HUD: {}", hud.join(" | "));
            }
            report.hud.push(hud);
        }

        if frame % FRAMES_PER_SECOND == 0 {
            let snapshot = sim.snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Snapshot serialization failed: {}", e),
            }
            report.snapshots.push(snapshot);
        }

        if sim.exit_requested() {
            report.exited_early = true;
            break;
        }
    }

    tracing::info!("Headless run finished at frame {}", sim.frame());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;
    use bunker_core::objective::EXIT_PROMPT;
    use clap::Parser;
    use std::path::PathBuf;

    const SCENE: &str = r#"
name: test_bunker
player:
  spawn: [0.0, 4.0, 0.0]
exit_zone:
  position: [0.0, 0.0, 0.0]
  radius: 20.0
nodes:
  - name: floor
    transform:
      position: [0.0, -0.5, 0.0]
    collider:
      shape: box
      half_extents: [50.0, 0.5, 50.0]
  - name: lamps
    children:
      - name: lamp_a
        transform:
          position: [2.0, 3.0, 0.0]
        light:
          kind: point
      - name: sun
        light:
          kind: directional
"#;

    fn project(name: &str) -> (PathBuf, Project) {
        let dir = std::env::temp_dir().join(format!("bunker_headless_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("scenes")).unwrap();
        std::fs::write(dir.join("bunker.yaml"), "scene: scenes/test.yaml\n").unwrap();
        std::fs::write(dir.join("scenes/test.yaml"), SCENE).unwrap();

        let args = CliArgs::parse_from(["bunker", "--project", dir.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        (dir, project)
    }

    #[test]
    fn test_headless_run_snapshots_each_second() {
        let (dir, project) = project("snapshots");
        let report = run_headless(&project, 120).unwrap();

        assert_eq!(report.snapshots.len(), 2);
        assert_eq!(report.snapshots[0].frame, 60);
        assert_eq!(report.snapshots[1].frame, 120);
        assert!(!report.exited_early);

        let last = &report.snapshots[1];
        assert!(last.grounded);
        // Feet on the floor, eye at eye height above it.
        assert!(last.position[1].abs() < 0.2, "y = {}", last.position[1]);
        assert!((last.camera[1] - 5.3).abs() < 0.2, "eye = {}", last.camera[1]);
        assert_eq!(last.lights, 2);
        assert!(!last.cursor_visible);
        assert!(last.seconds >= 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_headless_hud_shows_exit_prompt() {
        let (dir, project) = project("hud");
        let report = run_headless(&project, 90).unwrap();
        assert!(report
            .hud
            .iter()
            .any(|lines| lines.iter().any(|line| line == EXIT_PROMPT)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bundled_project_runs() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../project");
        let args = CliArgs::parse_from(["bunker", "--project", root.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        let report = run_headless(&project, 60).unwrap();

        let snapshot = &report.snapshots[0];
        assert_eq!(snapshot.lights, 7);
        // Moon, desk spot and four of the five point lamps.
        assert_eq!(snapshot.shadow_casters, 6);
    }

    #[test]
    fn test_headless_missing_scene_fails() {
        let dir = std::env::temp_dir().join(format!("bunker_headless_missing_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let args = CliArgs::parse_from(["bunker", "--project", dir.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        assert!(run_headless(&project, 10).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
