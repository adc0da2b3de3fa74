// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent conversation ledger for Mneme.
//!
//! Completed (prompt, response) turns are kept in a single JSON document
//! that is rewritten atomically on every change.

pub mod store;

pub use store::HistoryStore;
