// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mneme shell` command implementation.
//!
//! Launches an interactive REPL with colored prompt, streaming output,
//! and readline history. The similarity index is rebuilt from the
//! persisted ledger at startup, then every line goes through the
//! [`Dispatcher`].

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use mneme_agent::{
    cancel_on_ctrl_c, load_system_prompt, Dispatch, Dispatcher, ResponseOutcome, ResponseSink,
    ResponseStreamer,
};
use mneme_config::model::{IndexConfig, MnemeConfig};
use mneme_core::{
    CompletionAdapter, EmbeddingAdapter, HealthStatus, MnemeError, PluginAdapter,
    RetrievalAdapter,
};
use mneme_history::HistoryStore;
use mneme_memory::{
    rebuild_index, FilteredRetriever, QueryExpander, RecallOrchestrator, Recollection,
    VectorIndex,
};
use mneme_ollama::{OllamaEmbedder, OllamaProvider};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const GOODBYE: &str = "Exiting the assistant. Goodbye!";

/// Runs the `mneme shell` interactive REPL.
pub async fn run_shell(config: MnemeConfig) -> Result<(), MnemeError> {
    let provider = Arc::new(OllamaProvider::new(&config.ollama)?);
    let embedder = Arc::new(OllamaEmbedder::new(&config.ollama)?);
    warn_if_unhealthy(provider.as_ref()).await;
    warn_if_unhealthy(embedder.as_ref()).await;

    let completion: Arc<dyn CompletionAdapter> = provider;
    let embedder: Arc<dyn EmbeddingAdapter> = embedder;

    let index = Arc::new(open_index(&config.index, embedder).await?);
    let history = HistoryStore::new(config.history.path.clone());

    if config.index.rebuild_on_startup {
        match rebuild_index(index.as_ref(), &history.load()).await {
            Ok(count) => info!(count, "index rebuilt from history"),
            Err(e) => warn!(error = %e, "index rebuild failed, recall may be stale"),
        }
    }

    let retrieval: Arc<dyn RetrievalAdapter> = index;
    let recall = RecallOrchestrator::new(
        QueryExpander::new(completion.clone(), config.recall.max_expanded_queries),
        FilteredRetriever::from_config(retrieval, &config.recall),
    );
    let streamer = ResponseStreamer::new(completion, history.clone());
    let system_prompt = load_system_prompt(&config.agent).await;
    let mut dispatcher = Dispatcher::new(system_prompt, recall, streamer, history);

    // Set up readline editor.
    let mut rl = DefaultEditor::new()
        .map_err(|e| MnemeError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!(
        "Type {} to search past conversations, {} to drop the last one, {} to leave.\n",
        "/recall <text>".yellow(),
        "/forget".yellow(),
        "/exit".yellow()
    );

    let prompt = format!("{}", "USER: ".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(&line);
                }

                let cancel = CancellationToken::new();
                let interrupt = cancel_on_ctrl_c(cancel.clone());
                let mut sink = ConsoleSink::default();
                let dispatched = dispatcher.handle(&line, &mut sink, &cancel).await;
                interrupt.abort();

                match dispatched {
                    Ok(Dispatch::Exit) => {
                        println!("{GOODBYE}");
                        break;
                    }
                    Ok(Dispatch::Forgot { removed, .. }) => {
                        if removed > 0 {
                            println!("{}", "Last conversation removed.".dimmed());
                        } else {
                            println!("{}", "Nothing to forget.".dimmed());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        sink.end_line();
                        eprintln!("{}: {e}", "error".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                // Ctrl+C / Ctrl+D at the prompt
                println!("{GOODBYE}");
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    Ok(())
}

/// Opens the configured collection under `index.database_location`.
async fn open_index(
    config: &IndexConfig,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Result<VectorIndex, MnemeError> {
    VectorIndex::open(
        Path::new(&config.database_location),
        &config.collection_name,
        embedder,
    )
    .await
}

async fn warn_if_unhealthy(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => {}
        Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), %reason, "adapter is not healthy");
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "health check failed"),
    }
}

/// Writes a turn to the terminal as it streams.
#[derive(Default)]
struct ConsoleSink {
    in_response: bool,
}

impl ConsoleSink {
    fn begin_response(&mut self) {
        if !self.in_response {
            print!("\n{}", "ASSISTANT: ".cyan());
            self.in_response = true;
        }
    }

    fn end_line(&mut self) {
        if self.in_response {
            println!();
            self.in_response = false;
        }
    }
}

impl ResponseSink for ConsoleSink {
    fn on_recall(&mut self, recollection: &Recollection) {
        println!("{}", "Vector database queries:".dimmed());
        for query in &recollection.queries {
            println!("{}", format!("  {query}").dimmed());
        }
        println!("{}", "Recalled memories:".dimmed());
        for memory in &recollection.memories {
            println!("{}", format!("  - {memory}").dimmed());
        }
    }

    fn on_chunk(&mut self, chunk: &str) {
        self.begin_response();
        print!("{chunk}");
        std::io::stdout().flush().ok();
    }

    fn on_finish(&mut self, outcome: &ResponseOutcome) {
        self.begin_response();
        if !outcome.completed {
            print!(" {}", "[interrupted]".yellow());
        }
        println!("\n");
        self.in_response = false;
    }
}
