// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Mneme.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Mneme configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemeConfig {
    /// Assistant identity, logging and system prompt.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Ollama server and model selection.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Persistent conversation ledger.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Similarity index storage.
    #[serde(default)]
    pub index: IndexConfig,

    /// Recall pipeline tuning.
    #[serde(default)]
    pub recall: RecallConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt. Replaces the built-in prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "mneme".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Ollama server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model used for chat completions and query expansion.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used to embed conversation documents and queries.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature passed in the request options.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds, covering the whole streamed response.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP statuses (429, 500, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    1
}

/// Persistent history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Path to the JSON ledger file.
    #[serde(default = "default_history_path")]
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

fn default_history_path() -> String {
    data_path("message_history.json")
}

/// Similarity index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Directory holding the index database.
    #[serde(default = "default_database_location")]
    pub database_location: String,

    /// Logical collection the conversation documents are stored under.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Reset and re-populate the index from history when the shell starts.
    #[serde(default = "default_rebuild_on_startup")]
    pub rebuild_on_startup: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            database_location: default_database_location(),
            collection_name: default_collection_name(),
            rebuild_on_startup: default_rebuild_on_startup(),
        }
    }
}

fn default_database_location() -> String {
    data_path("index")
}

fn default_collection_name() -> String {
    "conversations".to_string()
}

fn default_rebuild_on_startup() -> bool {
    true
}

/// Recall pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Candidates requested from the index per query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Candidates at or above this distance are discarded.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Upper bound on alternate queries kept from expansion.
    #[serde(default = "default_max_expanded_queries")]
    pub max_expanded_queries: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            results_per_query: default_results_per_query(),
            similarity_threshold: default_similarity_threshold(),
            max_expanded_queries: default_max_expanded_queries(),
        }
    }
}

fn default_results_per_query() -> usize {
    2
}

fn default_similarity_threshold() -> f32 {
    0.4
}

fn default_max_expanded_queries() -> usize {
    5
}

fn data_path(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("mneme").join(name))
        .unwrap_or_else(|| PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}
