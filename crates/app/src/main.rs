use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mixer_guard_core::config::{DEFAULT_CASCADE_DELAY, DEFAULT_MIXER_PORT, DEFAULT_PROBE_BACKOFF};
use mixer_guard_core::{Agent, MixerGuardError, PipelineConfig, Settings, Verbosity};
use tracing_subscriber::EnvFilter;

fn main() -> mixer_guard_core::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();
    init_tracing(settings.verbosity);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(settings),
        Commands::Check => check(&settings.config_path),
    }
}

fn run(settings: Settings) -> mixer_guard_core::Result<()> {
    tracing::info!(
        mixer_ip = %settings.mixer_ip,
        mixer_port = settings.mixer_port,
        local_ip = %settings.local_ip,
        verbosity = ?settings.verbosity,
        config = ?settings.config_path,
        "current parameters"
    );

    let agent = Agent::from_settings(settings)?;
    agent.run()
}

fn check(path: &PathBuf) -> mixer_guard_core::Result<()> {
    let config = PipelineConfig::load(path)?;
    let summary = serde_json::to_string_pretty(&config.summary())
        .map_err(|err| MixerGuardError::msg(err.to_string()))?;
    println!("{summary}");
    Ok(())
}

fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive())),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keeps a mixing console in line with a declarative rule set", long_about = None)]
struct Cli {
    /// IP address of the mixer.
    #[arg(long, alias = "x32IP", default_value = "192.168.56.3", global = true)]
    mixer_ip: IpAddr,
    /// OSC port of the mixer.
    #[arg(long, alias = "x32Port", default_value_t = DEFAULT_MIXER_PORT, global = true)]
    mixer_port: u16,
    /// Local IP address to bind to.
    #[arg(long, alias = "localIP", default_value = "192.168.56.1", global = true)]
    local_ip: IpAddr,
    /// 0: errors only, 1: value changes and cascades, 2: everything including raw bytes.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2), global = true)]
    verbosity: u8,
    /// Path to the YAML pipeline file.
    #[arg(long, default_value = "pipeline.yaml", global = true)]
    config: PathBuf,
    /// Milliseconds between control cycles.
    #[arg(long, default_value_t = 500, global = true)]
    poll_interval_ms: u64,
    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            mixer_ip: self.mixer_ip,
            mixer_port: self.mixer_port,
            local_ip: self.local_ip,
            verbosity: Verbosity::from_level(self.verbosity),
            config_path: self.config.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cascade_delay: DEFAULT_CASCADE_DELAY,
            probe_backoff: DEFAULT_PROBE_BACKOFF,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch, react and enforce until terminated (the default).
    Run,
    /// Validate the pipeline file and print a summary without touching the network.
    Check,
}
