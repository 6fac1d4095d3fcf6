//! pushprefs - inspect and edit cached push-notification display preferences

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pushprefs_core::{open_store, BackendKind, NotificationPreferences, PrefsConfig};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pushprefs",
    version,
    about = "Inspect and edit cached push-notification display preferences",
    long_about = "Reads and writes the title, ticker text and display flag used when an\n\
                  incoming push notification is shown.\n\
                  \n\
                  Examples:\n\
                    pushprefs show                      # Print all preferences\n\
                    pushprefs show --json               # Same, as JSON\n\
                    pushprefs get title                 # Print one value\n\
                    pushprefs set title \"Alert\"         # Store the title\n\
                    pushprefs set display-flag 1        # Show notifications anytime\n\
                    pushprefs where                     # Print the store location\n\
                  \n\
                  Environment Variables:\n\
                    PUSHPREFS_CONFIG                    # Config file path\n\
                    PUSHPREFS_BACKEND                   # Store backend: json|sqlite|memory\n\
                    PUSHPREFS_DATA_DIR                  # Store directory\n\
                    RUST_LOG                            # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: <config_dir>/pushprefs/config.toml)
    #[arg(long, env = "PUSHPREFS_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend, overrides the config file
    #[arg(long, env = "PUSHPREFS_BACKEND")]
    backend: Option<BackendKind>,

    /// Store directory, overrides the config file
    #[arg(long, env = "PUSHPREFS_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print one preference
    Get {
        #[arg(value_enum)]
        field: Field,
    },
    /// Store one preference
    Set {
        #[command(subcommand)]
        field: SetField,
    },
    /// Print all preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print where preferences are stored
    Where,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Field {
    Title,
    Ticker,
    DisplayFlag,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum SetField {
    /// Notification title
    Title { text: String },
    /// Status bar ticker text
    Ticker { text: String },
    /// Display flag (0 = only in background, 1 = anytime)
    DisplayFlag {
        #[arg(allow_negative_numbers = true)]
        flag: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    debug!(backend = ?config.backend, data_dir = ?config.data_dir, "Configuration resolved");

    let store = open_store(&config).context("Failed to open preference store")?;
    let location = store.location();
    let prefs = NotificationPreferences::with_options(store, config.notification_options())
        .context("Failed to open notification preferences")?;

    match cli.command {
        Command::Get { field } => cli::print_field(&prefs, field),
        Command::Set { field } => cli::store_field(&prefs, field)?,
        Command::Show { json } => cli::print_all(&prefs, json)?,
        Command::Where => cli::print_location(location),
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PrefsConfig> {
    let mut config = match &cli.config {
        Some(path) => PrefsConfig::load_from(path),
        None => PrefsConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}
