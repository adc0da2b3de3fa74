// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mneme.toml` > `~/.config/mneme/mneme.toml` > `/etc/mneme/mneme.toml`
//! with environment variable overrides via `MNEME_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MnemeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mneme/mneme.toml` (system-wide)
/// 3. `~/.config/mneme/mneme.toml` (user XDG config)
/// 4. `./mneme.toml` (local directory)
/// 5. `MNEME_*` environment variables
pub fn load_config() -> Result<MnemeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MnemeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MnemeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MnemeConfig::default()))
        .merge(Toml::file("/etc/mneme/mneme.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mneme/mneme.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mneme.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with an explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MNEME_OLLAMA_CHAT_MODEL` must map to `ollama.chat_model`,
/// not `ollama.chat.model`.
fn env_provider() -> Env {
    Env::prefixed("MNEME_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["agent", "ollama", "history", "index", "recall"];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("ollama_chat_model"), "ollama.chat_model");
        assert_eq!(map_env_key("recall_similarity_threshold"), "recall.similarity_threshold");
        assert_eq!(map_env_key("index_database_location"), "index.database_location");
        assert_eq!(map_env_key("agent_log_level"), "agent.log_level");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }
}
