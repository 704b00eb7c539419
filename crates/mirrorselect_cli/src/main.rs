//! Mirrorselect CLI - manage which repositories a code-search backend syncs.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::status::OutputFormat;

#[derive(Parser)]
#[command(name = "mirrorselect")]
#[command(version)]
#[command(about = "Select and sync repositories on a code-search backend")]
#[command(
    long_about = "Mirrorselect talks to a code-search platform backend on behalf of one \
principal. It shows the configured code hosts and the affiliated repository \
catalog, lets you choose which repositories to sync, submits the selection, \
and waits until every code host has finished applying it."
)]
#[command(after_long_help = r#"EXAMPLES
    Show the configured code hosts:
        $ mirrorselect status

    List the affiliated catalog with current selections:
        $ mirrorselect repos --filter widget

    Sync two specific repositories and wait for convergence:
        $ mirrorselect sync --repo acme/widget --repo acme/gadget

    Sync everything the connected accounts can reach:
        $ mirrorselect sync --all

    Stop syncing affiliated repositories entirely:
        $ mirrorselect sync --none

    Generate shell completions:
        $ mirrorselect completions zsh > ~/.zfunc/_mirrorselect

CONFIGURATION
    Mirrorselect reads configuration from:
      1. ~/.config/mirrorselect/config.toml (or $XDG_CONFIG_HOME/mirrorselect/config.toml)
      2. ./mirrorselect.toml
      3. Environment variables (MIRRORSELECT_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    MIRRORSELECT_BACKEND_URL     Base URL of the platform backend (required)
    MIRRORSELECT_BACKEND_TOKEN   Bearer token for the backend API
    MIRRORSELECT_PRINCIPAL       Principal whose selection is managed
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show code hosts and their sync state
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// List the affiliated repository catalog and current selection
    Repos {
        /// Only show repositories whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,

        /// Only show private repositories
        #[arg(long)]
        private_only: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Change the selection and wait for the backend to apply it
    Sync(commands::sync::SyncArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Structured logging only when output is not a terminal (CI, pipes).
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("mirrorselect=info,mirrorselect_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    // Commands that need no backend at all.
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let config = config::Config::load();

    match cli.command {
        Commands::Status { output } => {
            commands::status::handle_status(&config, output).await?;
        }
        Commands::Repos {
            filter,
            private_only,
            output,
        } => {
            commands::repos::handle_repos(&config, filter.as_deref(), private_only, output).await?;
        }
        Commands::Sync(args) => {
            commands::sync::handle_sync(&config, args).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
