// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion adapter trait for LLM text generation.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::MnemeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionContext;

/// Finite, forward-only sequence of text fragments for one completion request.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, MnemeError>> + Send>>;

/// Adapter for an opaque text-completion service.
///
/// Failures are reported as `Err`, never as text, so callers cannot mistake
/// an error message for a genuine answer.
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    /// Runs a single-shot completion and returns the full text.
    async fn invoke(&self, context: CompletionContext) -> Result<String, MnemeError>;

    /// Starts a streaming completion over a linear prompt. The stream is not restartable.
    async fn stream(&self, prompt: String) -> Result<TextStream, MnemeError>;
}
