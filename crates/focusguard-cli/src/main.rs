use clap::{Parser, Subcommand};
use focusguard_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusguard", version, about = "Focusguard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work/break session timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Timer settings stored alongside the session
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Blocked site list
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Report a completed navigation (records the previous page's visit)
    Visit(commands::visit::VisitArgs),
    /// Check whether a URL would be blocked right now
    Check(commands::visit::CheckArgs),
    /// Browsing time totals
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Install the stderr log subscriber. `FOCUSGUARD_LOG` overrides the
/// configured level.
fn init_logging() {
    let config = Config::load();
    let level = match &config {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    let filter = EnvFilter::try_from_env("FOCUSGUARD_LOG")
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = config {
        tracing::warn!(error = %e, "failed to load config, using defaults");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Block { action } => commands::block::run(action),
        Commands::Visit(args) => commands::visit::run_visit(args),
        Commands::Check(args) => commands::visit::run_check(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
