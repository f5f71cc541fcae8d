use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "bunker", version, about = "bunker - first-person walk through a lit underground scene")]
pub struct CliArgs {
    /// Path to the project root (searched upward for bunker.yaml)
    #[arg(long, default_value = ".")]
    pub project: String,

    /// Scene YAML to load instead of the one named in bunker.yaml
    #[arg(long)]
    pub scene: Option<String>,

    /// Run the simulation without a window
    #[arg(long)]
    pub headless: bool,

    /// Frames to simulate in headless mode (1/60 s each)
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Don't read menu commands from stdin
    #[arg(long)]
    pub no_menu: bool,
}
