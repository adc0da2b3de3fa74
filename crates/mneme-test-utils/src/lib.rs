// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mneme integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a running Ollama server.
//!
//! # Components
//!
//! - [`MockCompletion`] - Completion adapter with queued replies and streams
//! - [`MockEmbedder`] - Deterministic bag-of-words embedder
//! - [`TestHarness`] - A full dispatcher over temp-dir history and index

pub mod harness;
pub mod mock_completion;
pub mod mock_embedder;

pub use harness::TestHarness;
pub use mock_completion::MockCompletion;
pub use mock_embedder::MockEmbedder;
