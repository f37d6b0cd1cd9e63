//! `courier` command-line tool.
//!
//! ```bash
//! courier check
//! courier --config deploy/courier.toml commands
//! COURIER_TELEGRAM__TOKEN=123:abc courier bind
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use courier_runtime::config::LogOutput;
use courier_runtime::{ConfigLoader, CourierRuntime, LoggingBuilder};

/// Command engine tooling for the Courier chat bot.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about)]
struct Cli {
    /// Configuration file (searched in the working and user config directories otherwise)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Configuration profile (overrides COURIER_PROFILE)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the command menu with the platform for every scope
    Bind,

    /// Print the documented command list as JSON
    Commands,

    /// Load and validate the configuration
    Check,
}

fn loader(cli: &Cli) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }
    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = CourierRuntime::load(loader(&cli)).context("failed to load configuration")?;

    // Command output goes to stdout; keep log lines off it.
    let mut logging = LoggingBuilder::from_config(&runtime.config().logging);
    if runtime.config().logging.output == LogOutput::Stdout {
        logging = logging.output(LogOutput::Stderr);
    }
    logging.init();

    match cli.command {
        Commands::Bind => {
            let acks = runtime
                .bind_commands()
                .await
                .context("failed to bind command menus")?;
            println!("{}", serde_json::to_string_pretty(&acks)?);
        }
        Commands::Commands => {
            println!("{}", serde_json::to_string_pretty(&runtime.commands_document())?);
        }
        Commands::Check => {
            let settings = runtime.settings();
            info!(
                commands = runtime.registry().commands().len(),
                aliases = settings.custom_commands.len(),
                plugins = settings.plugin_commands.len(),
                "Configuration checked"
            );
            println!("Configuration OK");
        }
    }
    Ok(())
}
