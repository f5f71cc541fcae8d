use std::process::ExitCode;

use clap::Parser;

use bunker_client::cli::CliArgs;
use bunker_client::engine::Engine;
use bunker_client::headless::run_headless;
use bunker_client::project::Project;
use bunker_core::error::SetupError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!("bunker v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Project root: {}", args.project);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), SetupError> {
    let project = Project::resolve(&args)?;

    if args.headless {
        run_headless(&project, args.frames)?;
        return Ok(());
    }

    let event_loop =
        winit::event_loop::EventLoop::new().map_err(|e| SetupError::Window(e.to_string()))?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut engine = Engine::new(project, !args.no_menu);
    event_loop
        .run_app(&mut engine)
        .map_err(|e| SetupError::Window(e.to_string()))?;

    match engine.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
