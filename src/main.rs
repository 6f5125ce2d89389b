//! # docket CLI
//!
//! ## Usage
//!
//! ```bash
//! docket --config ./config/docket.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docket init` | Create the SQLite database and schema |
//! | `docket ingest` | Reconcile the documents directory once |
//! | `docket list` | List all reports ordered by name |
//! | `docket search "<term>"` | Search report text through the index |
//! | `docket get <id>` | Print a full report |
//! | `docket serve` | Ingest, then start the HTTP API |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docket::{config, get, ingest, migrate, search, server};

/// docket: plain-text report ingestion, search, and tagging.
#[derive(Parser)]
#[command(
    name = "docket",
    about = "docket: plain-text report ingestion, search, and tagging",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docket.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Add every new file in the documents directory to the store and index.
    ///
    /// Files whose report already exists are skipped. A failing file is
    /// reported and does not stop the others.
    Ingest,

    /// List all reports ordered by name.
    List,

    /// Search report text.
    ///
    /// An empty term lists every report instead of querying the index.
    Search {
        /// The search term.
        term: String,
    },

    /// Print a report by id, including its full text and tags.
    Get {
        /// Report id.
        id: i64,
    },

    /// Reconcile the documents directory, then serve the HTTP API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest => {
            ingest::run_ingest(&cfg).await?;
        }
        Commands::List => {
            search::run_search(&cfg, None).await?;
        }
        Commands::Search { term } => {
            search::run_search(&cfg, Some(&term)).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
