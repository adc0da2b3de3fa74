// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external services Mneme consumes.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod completion;
pub mod embedding;
pub mod retrieval;

pub use adapter::PluginAdapter;
pub use completion::{CompletionAdapter, TextStream};
pub use embedding::EmbeddingAdapter;
pub use retrieval::RetrievalAdapter;
