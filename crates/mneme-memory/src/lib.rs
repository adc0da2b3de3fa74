// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation recall for Mneme.
//!
//! A `/recall` turn flows through three stages:
//! 1. [`QueryExpander`] asks the chat model for alternate search queries.
//! 2. [`FilteredRetriever`] searches the index for each query, keeping
//!    close, previously unseen matches.
//! 3. [`RecallOrchestrator`] formats the survivors into one user message
//!    on the session buffer.
//!
//! [`VectorIndex`] is the bundled SQLite index the retriever searches, and
//! [`rebuild_index`] repopulates it from the persisted history.

pub mod expansion;
pub mod index;
pub mod recall;
pub mod retriever;

pub use expansion::{QueryExpander, EXPANSION_PROMPT};
pub use index::{rebuild_index, VectorIndex};
pub use recall::{RecallOrchestrator, Recollection};
pub use retriever::{filter_candidates, FilteredRetriever, NO_RELEVANT_INFORMATION};
