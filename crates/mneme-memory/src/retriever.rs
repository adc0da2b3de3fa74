// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity-filtered retrieval across a batch of queries.
//!
//! Each query asks the index for its top `k` candidates; a candidate is
//! kept when its distance is under the threshold and its content has not
//! already been kept earlier in the batch.

use std::collections::HashSet;
use std::sync::Arc;

use mneme_config::model::RecallConfig;
use mneme_core::{RetrievalAdapter, ScoredDocument};
use tracing::{debug, warn};

/// Returned as the only memory when no candidate passes the filter.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";

/// Retrieves memories for a batch of queries, applying the distance
/// threshold and content deduplication.
pub struct FilteredRetriever {
    index: Arc<dyn RetrievalAdapter>,
    results_per_query: usize,
    max_distance: f32,
}

impl FilteredRetriever {
    pub fn new(index: Arc<dyn RetrievalAdapter>, results_per_query: usize, max_distance: f32) -> Self {
        Self {
            index,
            results_per_query,
            max_distance,
        }
    }

    pub fn from_config(index: Arc<dyn RetrievalAdapter>, config: &RecallConfig) -> Self {
        Self::new(index, config.results_per_query, config.similarity_threshold)
    }

    /// Search every query and return the kept contents in discovery order.
    ///
    /// A failing query is logged and skipped. The result is never empty.
    pub async fn retrieve(&self, queries: &[String]) -> Vec<String> {
        let mut searched = HashSet::new();
        let mut batches = Vec::with_capacity(queries.len());

        for query in queries {
            if !searched.insert(query.as_str()) {
                continue;
            }
            match self.index.similarity_search(query, self.results_per_query).await {
                Ok(candidates) => {
                    debug!(query = %query, candidates = candidates.len(), "similarity search");
                    batches.push(candidates);
                }
                Err(e) => warn!(query = %query, error = %e, "similarity search failed, skipping query"),
            }
        }

        filter_candidates(batches, self.max_distance)
    }
}

/// Apply the threshold and dedup rules to per-query candidate lists.
///
/// Batches are visited in order and each batch in rank order. A candidate
/// survives when `distance < max_distance` and its content is new. With no
/// survivors the result is the single [`NO_RELEVANT_INFORMATION`] entry.
pub fn filter_candidates<I>(batches: I, max_distance: f32) -> Vec<String>
where
    I: IntoIterator<Item = Vec<ScoredDocument>>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for candidate in batches.into_iter().flatten() {
        if candidate.distance < max_distance && seen.insert(candidate.content.clone()) {
            kept.push(candidate.content);
        }
    }

    if kept.is_empty() {
        kept.push(NO_RELEVANT_INFORMATION.to_string());
    }
    kept
}
