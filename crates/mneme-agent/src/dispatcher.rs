// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command parsing and per-line dispatch for an interactive session.

use mneme_core::{ChatMessage, MnemeError, SessionBuffer};
use mneme_history::HistoryStore;
use mneme_memory::{RecallOrchestrator, Recollection};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::responder::{ResponseOutcome, ResponseSink, ResponseStreamer, TurnKind};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/recall <prompt>`: answer with recalled memories, without persisting.
    Recall(String),
    /// `/forget`: drop the most recent persisted turn.
    Forget,
    /// `/exit` or `/quit`.
    Exit,
    /// Anything else is a prompt, blank lines included.
    Prompt(String),
}

impl Command {
    /// Parse one line. Commands are matched case-insensitively on the
    /// trimmed input; `/recall` and `/forget` are prefix matches.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_lowercase();

        if lower.starts_with("/recall") {
            // Drops the literal "/recall " (8 chars) whatever follows it.
            let rest: String = trimmed.chars().skip(8).collect();
            Command::Recall(rest.trim().to_string())
        } else if lower.starts_with("/forget") {
            Command::Forget
        } else if lower == "/exit" || lower == "/quit" {
            Command::Exit
        } else {
            Command::Prompt(trimmed.to_string())
        }
    }
}

/// What handling a line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A prompt was answered.
    Responded(ResponseOutcome),
    /// A recall ran and was answered.
    Recalled {
        recollection: Recollection,
        outcome: ResponseOutcome,
    },
    /// `/forget` targeted `target_id` and removed `removed` turns.
    Forgot { target_id: u64, removed: usize },
    /// The session should end.
    Exit,
}

/// Owns the session buffer and routes each input line.
pub struct Dispatcher {
    session: SessionBuffer,
    recall: RecallOrchestrator,
    streamer: ResponseStreamer,
    history: HistoryStore,
}

impl Dispatcher {
    /// Start a session whose first message is `system_prompt`.
    pub fn new(
        system_prompt: impl Into<String>,
        recall: RecallOrchestrator,
        streamer: ResponseStreamer,
        history: HistoryStore,
    ) -> Self {
        let mut session = SessionBuffer::new();
        session.push(ChatMessage::system(system_prompt));
        Self {
            session,
            recall,
            streamer,
            history,
        }
    }

    pub fn session(&self) -> &SessionBuffer {
        &self.session
    }

    /// Handle one line of input.
    ///
    /// A failed response is returned as an error. The user message stays in
    /// the session; nothing reaches the history ledger.
    pub async fn handle(
        &mut self,
        input: &str,
        sink: &mut dyn ResponseSink,
        cancel: &CancellationToken,
    ) -> Result<Dispatch, MnemeError> {
        match Command::parse(input) {
            Command::Recall(prompt) => {
                let recollection = self.recall.recall(&prompt, &mut self.session).await;
                sink.on_recall(&recollection);
                let outcome = self
                    .streamer
                    .respond(&mut self.session, &prompt, TurnKind::Recall, sink, cancel)
                    .await?;
                Ok(Dispatch::Recalled {
                    recollection,
                    outcome,
                })
            }
            Command::Forget => {
                // Targets id == count, which is the newest turn only while
                // ids are still contiguous.
                let target_id = self.history.len() as u64;
                let removed = self.history.remove(target_id)?;
                if removed == 0 {
                    warn!(target_id, "forget matched no stored turn");
                } else {
                    info!(target_id, removed, "forgot last conversation");
                }
                Ok(Dispatch::Forgot { target_id, removed })
            }
            Command::Exit => {
                debug!("exit requested");
                Ok(Dispatch::Exit)
            }
            Command::Prompt(prompt) => {
                self.session.push(ChatMessage::user(prompt.clone()));
                let outcome = self
                    .streamer
                    .respond(&mut self.session, &prompt, TurnKind::Plain, sink, cancel)
                    .await?;
                Ok(Dispatch::Responded(outcome))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{temp_history, FixedIndex, ScriptedCompletion, StreamScript};
    use mneme_core::{Role, ScoredDocument, Turn};
    use mneme_memory::{FilteredRetriever, QueryExpander};
    use std::sync::Arc;

    fn dispatcher(
        completion: Arc<ScriptedCompletion>,
        index: Arc<FixedIndex>,
        history: HistoryStore,
    ) -> Dispatcher {
        let recall = RecallOrchestrator::new(
            QueryExpander::new(completion.clone(), 5),
            FilteredRetriever::new(index, 2, 0.4),
        );
        let streamer = ResponseStreamer::new(completion, history.clone());
        Dispatcher::new("sys", recall, streamer, history)
    }

    fn turn(id: u64) -> Turn {
        Turn {
            id,
            prompt: format!("p{id}"),
            response: format!("r{id}"),
        }
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("/recall my dog"), Command::Recall("my dog".into()));
        assert_eq!(Command::parse("  /RECALL   my dog  "), Command::Recall("my dog".into()));
        assert_eq!(Command::parse("/recall"), Command::Recall(String::new()));
        assert_eq!(Command::parse("/forget"), Command::Forget);
        assert_eq!(Command::parse("/Forget please"), Command::Forget);
        assert_eq!(Command::parse("/exit"), Command::Exit);
        assert_eq!(Command::parse(" /QUIT "), Command::Exit);
        assert_eq!(Command::parse("   "), Command::Prompt(String::new()));
        assert_eq!(Command::parse("hello"), Command::Prompt("hello".into()));
    }

    #[test]
    fn exit_must_be_whole_input() {
        assert_eq!(
            Command::parse("/exit now"),
            Command::Prompt("/exit now".into())
        );
    }

    #[test]
    fn recall_prefix_skips_eight_chars() {
        assert_eq!(Command::parse("/recallme"), Command::Recall("e".into()));
        assert_eq!(Command::parse("/recall:dog"), Command::Recall("dog".into()));
        assert_eq!(Command::parse("/recall ñandú"), Command::Recall("ñandú".into()));
    }

    #[tokio::test]
    async fn new_session_starts_with_system_prompt() {
        let (_dir, history) = temp_history();
        let d = dispatcher(ScriptedCompletion::new(vec![]), FixedIndex::new(vec![]), history);
        assert_eq!(d.session().messages(), &[ChatMessage::system("sys")]);
    }

    #[tokio::test]
    async fn plain_prompt_adds_one_history_turn() {
        let (_dir, history) = temp_history();
        let completion = ScriptedCompletion::new(vec![StreamScript::chunks(&["hello"])]);
        let mut d = dispatcher(completion, FixedIndex::new(vec![]), history.clone());

        let dispatch = d
            .handle("hi", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(dispatch, Dispatch::Responded(ref o) if o.response == "hello"));
        assert_eq!(history.len(), 1);
        let roles: Vec<Role> = d.session().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn recall_leaves_history_untouched() {
        let (_dir, history) = temp_history();
        history.save(&[turn(1)]).unwrap();
        let completion = ScriptedCompletion::with_invoke_reply(
            vec![StreamScript::chunks(&["Max."])],
            r#"["pet name"]"#,
        );
        let index = FixedIndex::new(vec![(
            "pet name",
            vec![ScoredDocument::new("my dog is Max", 0.2)],
        )]);
        let mut d = dispatcher(completion.clone(), index, history.clone());

        let dispatch = d
            .handle("/recall dog name?", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();

        let Dispatch::Recalled { recollection, outcome } = dispatch else {
            panic!("expected recall dispatch");
        };
        assert_eq!(recollection.memories, vec!["my dog is Max"]);
        assert_eq!(outcome.response, "Max.");
        assert!(outcome.persisted.is_none());
        assert_eq!(history.len(), 1);

        let messages = d.session().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[1].content,
            "MEMORIES: - my dog is Max \n\n USER PROMPT: dog name?"
        );
        assert!(!messages.iter().any(|m| m.content == "dog name?"));
    }

    #[tokio::test]
    async fn forget_removes_turn_with_id_equal_to_count() {
        let (_dir, history) = temp_history();
        history.save(&[turn(1), turn(2), turn(3)]).unwrap();
        let mut d = dispatcher(ScriptedCompletion::new(vec![]), FixedIndex::new(vec![]), history.clone());

        let dispatch = d
            .handle("/forget", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(dispatch, Dispatch::Forgot { target_id: 3, removed: 1 });
        let ids: Vec<u64> = history.load().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn forget_after_gap_misses_newest_turn() {
        let (_dir, history) = temp_history();
        history.save(&[turn(1), turn(3)]).unwrap();
        let mut d = dispatcher(ScriptedCompletion::new(vec![]), FixedIndex::new(vec![]), history.clone());

        let dispatch = d
            .handle("/forget", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(dispatch, Dispatch::Forgot { target_id: 2, removed: 0 });
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn forget_on_empty_history_is_noop() {
        let (_dir, history) = temp_history();
        let mut d = dispatcher(ScriptedCompletion::new(vec![]), FixedIndex::new(vec![]), history);
        let dispatch = d
            .handle("/forget", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(dispatch, Dispatch::Forgot { target_id: 0, removed: 0 });
    }

    #[tokio::test]
    async fn exit_touches_nothing() {
        let (_dir, history) = temp_history();
        let mut d = dispatcher(ScriptedCompletion::new(vec![]), FixedIndex::new(vec![]), history);
        let cancel = CancellationToken::new();
        assert_eq!(d.handle("/quit", &mut Vec::<String>::new(), &cancel).await.unwrap(), Dispatch::Exit);
        assert_eq!(d.session().len(), 1);
    }

    #[tokio::test]
    async fn blank_line_is_answered_like_any_prompt() {
        let (_dir, history) = temp_history();
        let completion = ScriptedCompletion::new(vec![StreamScript::chunks(&["Hello?"])]);
        let mut d = dispatcher(completion, FixedIndex::new(vec![]), history.clone());

        let dispatch = d
            .handle("   ", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap();

        let Dispatch::Responded(outcome) = dispatch else {
            panic!("expected a response, got {dispatch:?}");
        };
        assert_eq!(outcome.response, "Hello?");
        assert_eq!(d.session().messages()[1], ChatMessage::user(""));
        let turns = history.load();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].prompt, "");
    }

    #[tokio::test]
    async fn provider_failure_is_returned() {
        let (_dir, history) = temp_history();
        let completion = ScriptedCompletion::new(vec![StreamScript::Unavailable]);
        let mut d = dispatcher(completion, FixedIndex::new(vec![]), history.clone());

        let err = d
            .handle("hi", &mut Vec::<String>::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemeError::Provider { .. }));
        assert!(history.is_empty());
    }
}
