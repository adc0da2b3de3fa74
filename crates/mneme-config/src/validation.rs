// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Every check runs; errors are collected rather than failing on the first.

use crate::diagnostic::ConfigError;
use crate::model::MnemeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &MnemeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        invalid(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let base_url = config.ollama.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        invalid(format!(
            "ollama.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    for (key, value) in [
        ("ollama.chat_model", &config.ollama.chat_model),
        ("ollama.embedding_model", &config.ollama.embedding_model),
        ("history.path", &config.history.path),
        ("index.database_location", &config.index.database_location),
        ("index.collection_name", &config.index.collection_name),
    ] {
        if value.trim().is_empty() {
            invalid(format!("{key} must not be empty"));
        }
    }

    if !(0.0..=2.0).contains(&config.ollama.temperature) {
        invalid(format!(
            "ollama.temperature must be between 0.0 and 2.0, got {}",
            config.ollama.temperature
        ));
    }

    if config.ollama.timeout_secs == 0 {
        invalid("ollama.timeout_secs must be greater than 0".to_string());
    }

    if config.recall.results_per_query == 0 {
        invalid("recall.results_per_query must be at least 1".to_string());
    }

    let threshold = config.recall.similarity_threshold;
    if !threshold.is_finite() || threshold <= 0.0 {
        invalid(format!(
            "recall.similarity_threshold must be a positive number, got {threshold}"
        ));
    }

    if config.recall.max_expanded_queries == 0 {
        invalid("recall.max_expanded_queries must be at least 1".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&MnemeConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let mut config = MnemeConfig::default();
        config.recall.results_per_query = 0;
        config.recall.similarity_threshold = -1.0;
        config.ollama.base_url = "localhost:11434".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = MnemeConfig::default();
        config.agent.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn blank_collection_name_rejected() {
        let mut config = MnemeConfig::default();
        config.index.collection_name = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("index.collection_name"));
    }
}
