// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mneme - a chat assistant that recalls past conversations.
//!
//! This is the binary entry point for the Mneme assistant.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use mneme_config::model::MnemeConfig;
use mneme_core::{MnemeError, Turn};
use mneme_history::HistoryStore;
use tracing_subscriber::EnvFilter;

/// Mneme - a chat assistant that recalls past conversations.
#[derive(Parser, Debug)]
#[command(name = "mneme", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive chat session (the default).
    Shell,
    /// Print the persisted conversation history.
    History,
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => mneme_config::load_and_validate_path(path),
        None => mneme_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mneme_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run_shell(config).await,
        Commands::History => print_history(&config),
        Commands::Config => print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so
/// streamed answers on stdout stay readable.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mneme={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_history(config: &MnemeConfig) -> Result<(), MnemeError> {
    let turns = HistoryStore::new(config.history.path.clone()).load();
    if turns.is_empty() {
        println!("{}", "no conversations recorded".dimmed());
        return Ok(());
    }
    for turn in &turns {
        println!("{}\n", render_turn(turn));
    }
    Ok(())
}

fn print_config(config: &MnemeConfig) -> Result<(), MnemeError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| MnemeError::Config(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

fn render_turn(turn: &Turn) -> String {
    format!(
        "[{}] USER: {}\n    ASSISTANT: {}",
        turn.id,
        turn.prompt.trim(),
        turn.response.trim()
    )
}
