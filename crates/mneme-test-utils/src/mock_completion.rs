// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic testing.
//!
//! `invoke` pops from a queue of expansion replies (default `[]`) and
//! `stream` pops from a queue of responses (default "mock response"),
//! streamed word by word.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use tokio::sync::Mutex;

use mneme_core::{
    AdapterType, CompletionAdapter, CompletionContext, HealthStatus, MnemeError, PluginAdapter,
    TextStream,
};

pub struct MockCompletion {
    replies: Mutex<VecDeque<String>>,
    responses: Mutex<VecDeque<String>>,
    invocations: Mutex<Vec<CompletionContext>>,
    stream_prompts: Mutex<Vec<String>>,
    fail_streams: AtomicBool,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Pre-load streamed responses, consumed in order.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responses: Mutex::new(VecDeque::from(responses)),
            invocations: Mutex::new(Vec::new()),
            stream_prompts: Mutex::new(Vec::new()),
            fail_streams: AtomicBool::new(false),
        }
    }

    /// Queue a reply for the next `invoke` call.
    pub async fn add_reply(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(text.into());
    }

    /// Queue a response for the next `stream` call.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Make every following `stream` call fail to open.
    pub fn fail_streams(&self, fail: bool) {
        self.fail_streams.store(fail, Ordering::SeqCst);
    }

    /// Contexts passed to `invoke`, oldest first.
    pub async fn invocations(&self) -> Vec<CompletionContext> {
        self.invocations.lock().await.clone()
    }

    /// Transcripts passed to `stream`, oldest first.
    pub async fn stream_prompts(&self) -> Vec<String> {
        self.stream_prompts.lock().await.clone()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into word chunks that concatenate back to the input.
fn word_chunks(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
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
impl CompletionAdapter for MockCompletion {
    async fn invoke(&self, context: CompletionContext) -> Result<String, MnemeError> {
        self.invocations.lock().await.push(context);
        Ok(self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "[]".to_string()))
    }

    async fn stream(&self, prompt: String) -> Result<TextStream, MnemeError> {
        self.stream_prompts.lock().await.push(prompt);
        if self.fail_streams.load(Ordering::SeqCst) {
            return Err(MnemeError::provider("mock stream unavailable"));
        }

        let text = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string());
        let chunks: Vec<Result<String, MnemeError>> =
            word_chunks(&text).into_iter().map(Ok).collect();
        Ok(stream::iter(chunks).boxed())
    }
}
