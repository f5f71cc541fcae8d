use thiserror::Error;

/// Errors reading or parsing `bunker.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading bunker.yaml: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse bunker.yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors loading a scene file.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error reading scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scene YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Scene '{0}' has no nodes")]
    EmptyScene(String),
    #[error("Scene '{0}' defines no player spawn and none was configured")]
    MissingSpawn(String),
}

/// Fatal startup failures. The simulation cannot run without a scene and a character.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Physics setup failed: {0}")]
    Physics(String),
    #[error("Window setup failed: {0}")]
    Window(String),
}

/// Failure of a single queued command. Logged by the drain, never propagated.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Failed(String),
    #[error("command panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

pub type CommandResult = Result<(), CommandError>;
