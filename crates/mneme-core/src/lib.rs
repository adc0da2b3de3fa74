// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Mneme.
//!
//! This crate provides the trait definitions, error type, and common types
//! shared by the memory-recall pipeline and the service adapters.

pub mod error;
pub mod session;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemeError;
pub use session::SessionBuffer;
pub use types::{
    AdapterType, ChatMessage, CompletionContext, EmbeddingInput, EmbeddingOutput, HealthStatus,
    Role, ScoredDocument, Turn,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CompletionAdapter, EmbeddingAdapter, PluginAdapter, RetrievalAdapter, TextStream,
};
