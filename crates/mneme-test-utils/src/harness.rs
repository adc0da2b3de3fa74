// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a full dispatcher with a mock completion
//! adapter, a temp-dir history ledger, and a real SQLite vector index
//! backed by [`MockEmbedder`].

use std::sync::Arc;

use mneme_agent::{Dispatch, Dispatcher, ResponseStreamer};
use mneme_config::model::RecallConfig;
use mneme_core::{MnemeError, Turn};
use mneme_history::HistoryStore;
use mneme_memory::{rebuild_index, FilteredRetriever, QueryExpander, RecallOrchestrator, VectorIndex};
use tokio_util::sync::CancellationToken;

use crate::mock_completion::MockCompletion;
use crate::mock_embedder::MockEmbedder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    history: Vec<(String, String)>,
    system_prompt: Option<String>,
    recall: RecallConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            history: Vec::new(),
            system_prompt: None,
            recall: RecallConfig::default(),
        }
    }

    /// Set streamed responses, consumed one per answered turn.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Seed the ledger with `(prompt, response)` turns before the index is built.
    pub fn with_history(mut self, turns: &[(&str, &str)]) -> Self {
        self.history = turns
            .iter()
            .map(|(p, r)| (p.to_string(), r.to_string()))
            .collect();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_recall_config(mut self, recall: RecallConfig) -> Self {
        self.recall = recall;
        self
    }

    /// Build the harness: seed history, rebuild the index, wire the dispatcher.
    pub async fn build(self) -> Result<TestHarness, MnemeError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MnemeError::Storage { source: e.into() })?;

        let history = HistoryStore::new(temp_dir.path().join("message_history.json"));
        for (prompt, response) in &self.history {
            history.append(prompt, response)?;
        }

        let index = Arc::new(
            VectorIndex::open(
                &temp_dir.path().join("index"),
                "conversations",
                Arc::new(MockEmbedder::new()),
            )
            .await?,
        );
        rebuild_index(index.as_ref(), &history.load()).await?;

        let completion = Arc::new(MockCompletion::with_responses(self.responses));
        let recall = RecallOrchestrator::new(
            QueryExpander::new(completion.clone(), self.recall.max_expanded_queries),
            FilteredRetriever::from_config(index.clone(), &self.recall),
        );
        let streamer = ResponseStreamer::new(completion.clone(), history.clone());
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| "You are a test assistant.".to_string());
        let dispatcher = Dispatcher::new(system_prompt, recall, streamer, history.clone());

        Ok(TestHarness {
            completion,
            history,
            index,
            dispatcher,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete session wired to mocks, for driving input lines in tests.
pub struct TestHarness {
    pub completion: Arc<MockCompletion>,
    pub history: HistoryStore,
    pub index: Arc<VectorIndex>,
    dispatcher: Dispatcher,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Feed one input line; returns the dispatch and the streamed chunks.
    pub async fn send(&mut self, input: &str) -> Result<(Dispatch, Vec<String>), MnemeError> {
        let mut chunks: Vec<String> = Vec::new();
        let dispatch = self
            .dispatcher
            .handle(input, &mut chunks, &CancellationToken::new())
            .await?;
        Ok((dispatch, chunks))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.history.load()
    }
}
