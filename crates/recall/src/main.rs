// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - operator CLI for the retrieval memory subsystem.
//!
//! This is the binary entry point: it loads configuration, installs
//! logging and dispatches to the subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod context;
mod index;
mod provider;
mod query;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall_config::model::RecallConfig;
use recall_core::RecallError;
use tokio_util::sync::CancellationToken;

/// Recall - vector cache and retrieval scoring for conversation memory.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed a JSON board export and register it in the vector store.
    Index {
        /// Path to a JSON array of board entries.
        file: PathBuf,
        /// Skip the embedding provider and use lexical vectors only.
        #[arg(long)]
        lexical_only: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Rank stored entries against a query.
    Query {
        /// Query text.
        text: String,
        /// Skip the embedding provider and use lexical vectors only.
        #[arg(long)]
        lexical_only: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show vector store size.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Evict least recently used vectors until the store fits its budget.
    Evict,
    /// Resolve and show the embedding provider.
    Provider {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> RecallConfig {
    let loaded = match path {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Print the effective configuration. The embedding API key is never rendered.
fn print_config(config: &RecallConfig) -> Result<(), RecallError> {
    let rendered =
        recall_config::render_toml(config).map_err(|e| RecallError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    init_tracing(&config.agent.log_level);

    let cancel = CancellationToken::new();
    context::cancel_on_ctrl_c(cancel.clone());

    let result = match cli.command {
        Some(Commands::Index {
            file,
            lexical_only,
            json,
        }) => index::run_index(&config, &file, lexical_only, json, &cancel).await,
        Some(Commands::Query {
            text,
            lexical_only,
            json,
        }) => query::run_query(&config, &text, lexical_only, json, &cancel).await,
        Some(Commands::Stats { json }) => stats::run_stats(&config, json).await,
        Some(Commands::Evict) => stats::run_evict(&config).await,
        Some(Commands::Provider { json }) => provider::run_provider(&config, json, &cancel).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("recall: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
