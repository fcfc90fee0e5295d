//! # SAP Help CLI (`sap-help`)
//!
//! Search the SAP Help Portal, read documents by result id, and serve both
//! operations as tools over HTTP or MCP stdio.
//!
//! ## Usage
//!
//! ```bash
//! sap-help --config ./config/sap-help.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sap-help search "<query>"` | Search SAP Help and list result ids |
//! | `sap-help get <id>` | Retrieve a document as bounded plain text |
//! | `sap-help serve http` | Start the HTTP tool API with the `/mcp` endpoint |
//! | `sap-help serve stdio` | Serve MCP over stdin/stdout |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sap_help_mcp::config::load_config;
use sap_help_mcp::get::{run_get, RenderOptions};
use sap_help_mcp::truncate::{TruncationStrategy, MIN_MAX_LENGTH};
use sap_help_mcp::{mcp, search, server};

const DEFAULT_CONFIG: &str = "./config/sap-help.toml";

/// SAP Help CLI: search and read SAP Help Portal documentation.
///
/// The config file is optional. When `--config` is not given,
/// `./config/sap-help.toml` is used if present, otherwise built-in defaults.
#[derive(Parser)]
#[command(
    name = "sap-help",
    about = "Search and read SAP Help Portal documentation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search SAP Help.
    ///
    /// Prints up to `[portal].result_window` ranked hits with the ids
    /// accepted by `get`.
    Search {
        /// Free-text query.
        query: String,
    },

    /// Retrieve a document by result id (`sap-help-<loio>`).
    Get {
        id: String,

        /// Maximum length of the output in characters (at least 500).
        #[arg(long)]
        max_length: Option<usize>,

        /// Truncation policy: `head_tail` or `head`.
        #[arg(long)]
        strategy: Option<TruncationStrategy>,
    },

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeCommands,
    },
}

#[derive(Subcommand)]
enum ServeCommands {
    /// HTTP tool API plus the MCP streamable HTTP endpoint at `/mcp`.
    Http,
    /// MCP over stdin/stdout.
    Stdio,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output and the stdio transport
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path, true)?,
        None => load_config(&PathBuf::from(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Commands::Search { query } => {
            search::run_search(&config, &query).await?;
        }
        Commands::Get {
            id,
            max_length,
            strategy,
        } => {
            let mut options = RenderOptions::from_config(&config.content);
            if let Some(max_length) = max_length {
                anyhow::ensure!(
                    max_length >= MIN_MAX_LENGTH,
                    "--max-length must be at least {}",
                    MIN_MAX_LENGTH
                );
                options.max_length = max_length;
            }
            if let Some(strategy) = strategy {
                options.strategy = strategy;
            }
            run_get(&config, &id, options).await?;
        }
        Commands::Serve { service } => match service {
            ServeCommands::Http => server::run_server(&config).await?,
            ServeCommands::Stdio => mcp::run_stdio(&config).await?,
        },
    }

    Ok(())
}
