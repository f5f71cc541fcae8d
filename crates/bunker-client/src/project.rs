//! Resolves the project root, `bunker.yaml` and the scene path from the
//! command line.

use std::path::{Path, PathBuf};

use bunker_core::config::{find_config, load_config, BunkerConfig};
use bunker_core::error::SetupError;
use bunker_core::scene::{load_scene, Scene};

use crate::cli::CliArgs;
use crate::input::{load_bindings, InputBindings};

#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: BunkerConfig,
    pub scene_path: PathBuf,
}

impl Project {
    /// A missing `bunker.yaml` means defaults; a broken one is an error.
    pub fn resolve(args: &CliArgs) -> Result<Self, SetupError> {
        let start = PathBuf::from(&args.project);
        let (root, config) = match find_config(&start) {
            Some(path) => {
                let config = load_config(&path)?;
                tracing::info!("Loaded {}", path.display());
                let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| start.clone());
                (root, config)
            }
            None => {
                tracing::info!("No bunker.yaml above {}, using defaults", start.display());
                (start, BunkerConfig::default())
            }
        };

        let scene = args.scene.clone().unwrap_or_else(|| config.scene.clone());
        let scene_path = root.join(scene);

        Ok(Self {
            root,
            config,
            scene_path,
        })
    }

    pub fn load_scene(&self) -> Result<Scene, SetupError> {
        Ok(load_scene(&self.scene_path)?)
    }

    pub fn bindings(&self) -> InputBindings {
        load_bindings(&self.root.join(&self.config.input.bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bunker_project_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = temp_dir("defaults");
        let args = CliArgs::parse_from(["bunker", "--project", dir.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        assert_eq!(project.root, dir);
        assert_eq!(project.scene_path, dir.join("scenes/bunker.yaml"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scene_override_and_config_root() {
        let dir = temp_dir("override");
        std::fs::write(dir.join("bunker.yaml"), "scene: scenes/other.yaml\n").unwrap();
        let nested = dir.join("scenes");
        std::fs::create_dir_all(&nested).unwrap();

        let args = CliArgs::parse_from(["bunker", "--project", nested.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        assert_eq!(project.root, dir);
        assert_eq!(project.scene_path, dir.join("scenes/other.yaml"));

        let args = CliArgs::parse_from([
            "bunker",
            "--project",
            dir.to_str().unwrap(),
            "--scene",
            "scenes/cli.yaml",
        ]);
        let project = Project::resolve(&args).unwrap();
        assert_eq!(project.scene_path, dir.join("scenes/cli.yaml"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_scene_is_fatal() {
        let dir = temp_dir("missing");
        let args = CliArgs::parse_from(["bunker", "--project", dir.to_str().unwrap()]);
        let project = Project::resolve(&args).unwrap();
        assert!(matches!(project.load_scene(), Err(SetupError::Scene(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_broken_config_is_fatal() {
        let dir = temp_dir("broken");
        std::fs::write(dir.join("bunker.yaml"), "player: [not, a, map]\n").unwrap();
        let args = CliArgs::parse_from(["bunker", "--project", dir.to_str().unwrap()]);
        assert!(matches!(Project::resolve(&args), Err(SetupError::Config(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
