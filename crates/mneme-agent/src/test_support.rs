// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted adapters shared by this crate's unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use mneme_core::{
    AdapterType, CompletionAdapter, CompletionContext, HealthStatus, MnemeError, PluginAdapter,
    RetrievalAdapter, ScoredDocument, TextStream,
};
use mneme_history::HistoryStore;
use tokio::sync::Mutex;

pub fn temp_history() -> (tempfile::TempDir, HistoryStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("message_history.json"));
    (dir, store)
}

/// How one `stream` call should behave.
pub enum StreamScript {
    Chunks(Vec<String>),
    FailingAfter(Vec<String>),
    StallingAfter(Vec<String>),
    Unavailable,
}

impl StreamScript {
    pub fn chunks(parts: &[&str]) -> Self {
        Self::Chunks(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn failing_after(parts: &[&str]) -> Self {
        Self::FailingAfter(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn stalling_after(parts: &[&str]) -> Self {
        Self::StallingAfter(parts.iter().map(|p| p.to_string()).collect())
    }
}

/// Completion adapter driven by a queue of stream scripts. `invoke`
/// answers with `invoke_reply`.
pub struct ScriptedCompletion {
    scripts: Mutex<VecDeque<StreamScript>>,
    invoke_reply: String,
    stream_prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(scripts: Vec<StreamScript>) -> Arc<Self> {
        Self::with_invoke_reply(scripts, "[]")
    }

    pub fn with_invoke_reply(scripts: Vec<StreamScript>, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            invoke_reply: reply.to_string(),
            stream_prompts: Mutex::new(Vec::new()),
        })
    }

    pub async fn stream_prompts(&self) -> Vec<String> {
        self.stream_prompts.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted-completion"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }
    async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
        Ok(HealthStatus::Healthy)
    }
    async fn shutdown(&self) -> Result<(), MnemeError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for ScriptedCompletion {
    async fn invoke(&self, _context: CompletionContext) -> Result<String, MnemeError> {
        Ok(self.invoke_reply.clone())
    }

    async fn stream(&self, prompt: String) -> Result<TextStream, MnemeError> {
        self.stream_prompts.lock().await.push(prompt);
        let script = self
            .scripts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| StreamScript::chunks(&["mock response"]));

        let ok = |parts: Vec<String>| stream::iter(parts.into_iter().map(Ok));
        match script {
            StreamScript::Chunks(parts) => Ok(ok(parts).boxed()),
            StreamScript::FailingAfter(parts) => Ok(ok(parts)
                .chain(stream::once(async { Err(MnemeError::provider("stream broke")) }))
                .boxed()),
            StreamScript::StallingAfter(parts) => Ok(ok(parts).chain(stream::pending()).boxed()),
            StreamScript::Unavailable => Err(MnemeError::provider("connection refused")),
        }
    }
}

/// Retrieval adapter returning fixed hits per query.
pub struct FixedIndex {
    hits: Vec<(String, Vec<ScoredDocument>)>,
}

impl FixedIndex {
    pub fn new(hits: Vec<(&str, Vec<ScoredDocument>)>) -> Arc<Self> {
        Arc::new(Self {
            hits: hits.into_iter().map(|(q, d)| (q.to_string(), d)).collect(),
        })
    }
}

#[async_trait]
impl PluginAdapter for FixedIndex {
    fn name(&self) -> &str {
        "fixed-index"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }
    async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
        Ok(HealthStatus::Healthy)
    }
    async fn shutdown(&self) -> Result<(), MnemeError> {
        Ok(())
    }
}

#[async_trait]
impl RetrievalAdapter for FixedIndex {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, MnemeError> {
        Ok(self
            .hits
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, docs)| docs.iter().take(k).cloned().collect())
            .unwrap_or_default())
    }
    async fn add(&self, _texts: Vec<String>, _ids: Vec<String>) -> Result<(), MnemeError> {
        Ok(())
    }
    async fn reset(&self) -> Result<(), MnemeError> {
        Ok(())
    }
}
