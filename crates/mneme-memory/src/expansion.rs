// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query expansion: turn one user prompt into several search queries.

use std::sync::Arc;

use mneme_core::{ChatMessage, CompletionAdapter, CompletionContext};
use tracing::{debug, warn};

/// Instruction sent as the system message of the expansion request.
pub const EXPANSION_PROMPT: &str = r#"You are a first-principle reasoning search query agent.
Create a list of relevant queries to search a vector database of all past conversations with the user.
Cover different angles of the prompt so that related conversations are found even when worded differently.
Output only a JSON array of strings, without explanation.

Examples:
prompt: "How can I improve my productivity at work?"
["productivity tips", "improve work efficiency", "time management techniques", "focus strategies", "work-life balance"]
prompt: "What are the best practices for healthy eating?"
["healthy eating habits", "balanced diet tips", "nutrition advice", "meal planning ideas", "healthy recipes"]
prompt: "How can I save money on my monthly expenses?"
["budgeting tips", "cutting monthly costs", "saving money strategies", "frugal living ideas", "expense tracking methods"]"#;

/// Asks the completion service for alternate phrasings of a prompt.
pub struct QueryExpander {
    completion: Arc<dyn CompletionAdapter>,
    max_queries: usize,
}

impl QueryExpander {
    pub fn new(completion: Arc<dyn CompletionAdapter>, max_queries: usize) -> Self {
        Self {
            completion,
            max_queries,
        }
    }

    /// Expand `prompt` into search queries.
    ///
    /// Never fails: a completion error or an unparseable reply yields
    /// `[prompt]`. A well-formed empty array yields no queries.
    pub async fn expand(&self, prompt: &str) -> Vec<String> {
        let context = CompletionContext::Messages(vec![
            ChatMessage::system(EXPANSION_PROMPT),
            ChatMessage::user(prompt),
        ]);

        let reply = match self.completion.invoke(context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "query expansion failed, using original prompt");
                return vec![prompt.to_string()];
            }
        };

        match parse_queries(&reply) {
            Some(queries) => {
                let queries: Vec<String> = queries
                    .into_iter()
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .take(self.max_queries)
                    .collect();
                debug!(count = queries.len(), "expanded prompt into queries");
                queries
            }
            None => {
                warn!("could not parse expansion reply, using original prompt");
                debug!(reply = %reply, "raw expansion reply");
                vec![prompt.to_string()]
            }
        }
    }
}

/// Extract a JSON array of strings from a model reply.
///
/// Tolerates Markdown code fences and prose around the array by taking
/// the text from the first `[` to the last `]`.
pub fn parse_queries(reply: &str) -> Option<Vec<String>> {
    let trimmed = strip_code_fence(reply.trim());
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Vec<String>>(&trimmed[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, e.g. ```json
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
