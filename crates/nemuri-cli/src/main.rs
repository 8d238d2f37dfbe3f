use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nemuri-cli", version, about = "Nemuri CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sleep monitor control
    Monitor {
        #[command(subcommand)]
        action: commands::monitor::MonitorAction,
    },
    /// Wake-up alarm control
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Ambient light utilities
    Light {
        #[command(subcommand)]
        action: commands::light::LightAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Monitor { action } => commands::monitor::run(action),
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Light { action } => commands::light::run(action),
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
