// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt loading and transcript rendering.

use mneme_config::model::AgentConfig;
use mneme_core::ChatMessage;
use tracing::{info, warn};

/// Built-in system prompt, used when the config supplies none.
pub const SYSTEM_PROMPT: &str = "You are a highly capable assistant with perfect memory of all prior conversations with the user.
For every user prompt, silently recall and use only relevant information from past interactions to improve the accuracy and usefulness of your response.
Ignore any memories that are not clearly related to the current query.
Always respond in a friendly, direct, and helpful manner.
Never mention or imply that you have memory, past conversations, or are an AI assistant.
Do not explain how you generate responses or refer to system behavior.
Answer the user's query directly, without filler, small talk, or unnecessary preamble.
Be concise and precise, as if you pay for every word.
If you are unsure or lack information, respond with \"I don't know.\"
Your goal is to be useful, trustworthy, and efficient at all times.";

/// Loads the system prompt following priority: file > inline > built-in.
pub async fn load_system_prompt(config: &AgentConfig) -> String {
    if let Some(file_path) = &config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = file_path, "loaded system prompt from file");
                return content.trim().to_string();
            }
            Ok(_) => warn!(path = file_path, "system prompt file is empty, falling back"),
            Err(e) => warn!(
                path = file_path,
                error = %e,
                "failed to read system prompt file, falling back"
            ),
        }
    }

    match &config.system_prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt.clone(),
        _ => SYSTEM_PROMPT.to_string(),
    }
}

/// Render messages as `ROLE: content` lines followed by an `ASSISTANT:` cue.
///
/// An empty conversation renders as the empty string.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let mut lines: Vec<String> = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content.trim()))
        .collect();
    lines.push("ASSISTANT:".to_string());
    lines.join("\n")
}
