// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval adapter trait for similarity search over past turns.

use async_trait::async_trait;

use crate::error::MnemeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ScoredDocument;

/// Adapter for a similarity-search service over an indexed corpus.
#[async_trait]
pub trait RetrievalAdapter: PluginAdapter {
    /// Returns up to `k` entries nearest to `query`, ranked by ascending distance.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, MnemeError>;

    /// Upserts `texts` under the matching `ids`.
    async fn add(&self, texts: Vec<String>, ids: Vec<String>) -> Result<(), MnemeError>;

    /// Destroys and recreates the underlying index.
    async fn reset(&self) -> Result<(), MnemeError>;
}
