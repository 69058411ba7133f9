//! finicky-helper: CLI for Finicky config backups, generation and iCloud sync
//!
//! This tool is not affiliated with or endorsed by the Finicky project.
//! It only touches the config file and its backups on your machine.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::utils::{GlobalOptions, Session};

#[derive(Parser)]
#[command(name = "finicky-helper")]
#[command(about = "CLI helper for Finicky config operations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file candidate, highest priority first (repeatable; replaces the defaults)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_paths: Vec<PathBuf>,

    /// Directory backups are stored in (default: ~/finicky/backups)
    #[arg(long, global = true, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Synced folder the config is moved into (default: iCloud Drive)
    #[arg(long, global = true, value_name = "DIR")]
    cloud_root: Option<PathBuf>,

    /// Print the result as a JSON response envelope
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the config is synced to iCloud
    Status,

    /// Move the config into iCloud Drive and leave a symlink in its place
    Enable,

    /// Bring the config back from iCloud Drive
    Disable,

    /// Write a config generated from a JSON route description
    Save {
        /// Request file (use - for stdin)
        request: String,
    },

    /// Print the config a request would generate, without writing it
    Preview {
        /// Request file (use - for stdin)
        request: String,
    },

    /// List retained backups of the active config
    Backups,

    /// List Chromium browser profiles
    Profiles,

    /// List browsers generated routes can target
    Browsers,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let options = GlobalOptions {
        config_paths: cli.global.config_paths,
        backup_dir: cli.global.backup_dir,
        cloud_root: cli.global.cloud_root,
        json: cli.global.json,
    };
    let session = Session::open(&options)?;

    match cli.command {
        Commands::Status => commands::sync::status(&session)?,
        Commands::Enable => commands::sync::enable(&session)?,
        Commands::Disable => commands::sync::disable(&session)?,
        Commands::Save { request } => commands::generate::save(&session, &request)?,
        Commands::Preview { request } => commands::generate::preview(&session, &request)?,
        Commands::Backups => commands::backups::execute(&session)?,
        Commands::Profiles => commands::profiles::execute(&session)?,
        Commands::Browsers => commands::profiles::browsers(&session)?,
    }

    Ok(())
}
