// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall orchestration: expand, retrieve, and splice memories into the
//! session as a single user message.

use mneme_core::{ChatMessage, SessionBuffer};
use tracing::info;

use crate::expansion::QueryExpander;
use crate::retriever::FilteredRetriever;

/// What a recall produced, for display by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recollection {
    /// Alternate queries from expansion (excluding the prompt itself).
    pub queries: Vec<String>,
    /// Memories kept after filtering, in discovery order.
    pub memories: Vec<String>,
    /// The user message pushed onto the session buffer.
    pub fused_prompt: String,
}

pub struct RecallOrchestrator {
    expander: QueryExpander,
    retriever: FilteredRetriever,
}

impl RecallOrchestrator {
    pub fn new(expander: QueryExpander, retriever: FilteredRetriever) -> Self {
        Self {
            expander,
            retriever,
        }
    }

    /// Gather memories for `prompt` and push the fused user message.
    ///
    /// The prompt is always searched first, ahead of its expansions. The
    /// unadorned prompt is never pushed on its own.
    pub async fn recall(&self, prompt: &str, session: &mut SessionBuffer) -> Recollection {
        let queries = self.expander.expand(prompt).await;

        let mut search = Vec::with_capacity(queries.len() + 1);
        search.push(prompt.to_string());
        search.extend(queries.iter().cloned());

        let memories = self.retriever.retrieve(&search).await;
        info!(
            queries = search.len(),
            memories = memories.len(),
            "recalled memories"
        );

        let fused_prompt = fuse_prompt(&format_memory_block(&memories), prompt);
        session.push(ChatMessage::user(fused_prompt.clone()));

        Recollection {
            queries,
            memories,
            fused_prompt,
        }
    }
}

/// One `- item` line per memory.
pub fn format_memory_block(memories: &[String]) -> String {
    memories
        .iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The user message carrying recalled memories ahead of the prompt.
pub fn fuse_prompt(memory_block: &str, prompt: &str) -> String {
    format!("MEMORIES: {memory_block} \n\n USER PROMPT: {prompt}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::NO_RELEVANT_INFORMATION;
    use async_trait::async_trait;
    use mneme_core::{
        AdapterType, CompletionAdapter, CompletionContext, HealthStatus, MnemeError,
        PluginAdapter, RetrievalAdapter, Role, ScoredDocument, TextStream,
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct Fixed(&'static str);

    #[async_trait]
    impl PluginAdapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Completion
        }
        async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), MnemeError> {
            Ok(())
        }
    }

    #[async_trait]
    impl CompletionAdapter for Fixed {
        async fn invoke(&self, _context: CompletionContext) -> Result<String, MnemeError> {
            Ok(self.0.to_string())
        }
        async fn stream(&self, _prompt: String) -> Result<TextStream, MnemeError> {
            Err(MnemeError::provider("unused"))
        }
    }

    #[derive(Default)]
    struct Recording {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PluginAdapter for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Retrieval
        }
        async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), MnemeError> {
            Ok(())
        }
    }

    #[async_trait]
    impl RetrievalAdapter for Recording {
        async fn similarity_search(&self, query: &str, _k: usize) -> Result<Vec<ScoredDocument>, MnemeError> {
            self.queries.lock().await.push(query.to_string());
            if query == "pet name" {
                Ok(vec![ScoredDocument::new("my dog is Max", 0.1)])
            } else {
                Ok(Vec::new())
            }
        }
        async fn add(&self, _texts: Vec<String>, _ids: Vec<String>) -> Result<(), MnemeError> {
            Ok(())
        }
        async fn reset(&self) -> Result<(), MnemeError> {
            Ok(())
        }
    }

    fn orchestrator(reply: &'static str, index: Arc<Recording>) -> RecallOrchestrator {
        RecallOrchestrator::new(
            QueryExpander::new(Arc::new(Fixed(reply)), 5),
            FilteredRetriever::new(index, 2, 0.4),
        )
    }

    #[test]
    fn memory_block_is_bulleted() {
        let block = format_memory_block(&["a".to_string(), "b".to_string()]);
        assert_eq!(block, "- a\n- b");
    }

    #[tokio::test]
    async fn pushes_single_fused_message() {
        let index = Arc::new(Recording::default());
        let recall = orchestrator(r#"["pet name"]"#, index.clone());
        let mut session = SessionBuffer::new();
        session.push(ChatMessage::system("sys"));

        let result = recall.recall("what's my dog called?", &mut session).await;

        assert_eq!(session.len(), 2);
        let last = session.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content,
            "MEMORIES: - my dog is Max \n\n USER PROMPT: what's my dog called?"
        );
        assert_eq!(result.fused_prompt, last.content);
        assert_eq!(result.queries, vec!["pet name"]);
        assert_eq!(result.memories, vec!["my dog is Max"]);
        assert_eq!(
            *index.queries.lock().await,
            vec!["what's my dog called?", "pet name"]
        );
    }

    #[tokio::test]
    async fn no_memories_uses_sentinel() {
        let index = Arc::new(Recording::default());
        let recall = orchestrator("[]", index);
        let mut session = SessionBuffer::new();

        let result = recall.recall("anything", &mut session).await;
        assert_eq!(result.memories, vec![NO_RELEVANT_INFORMATION]);
        assert!(result.fused_prompt.starts_with("MEMORIES: - No relevant information found."));
    }

    #[tokio::test]
    async fn fallback_query_is_searched_once() {
        let index = Arc::new(Recording::default());
        let recall = orchestrator("not a list", index.clone());
        let mut session = SessionBuffer::new();

        let result = recall.recall("dog", &mut session).await;
        assert_eq!(result.queries, vec!["dog"]);
        assert_eq!(*index.queries.lock().await, vec!["dog"]);
    }
}
