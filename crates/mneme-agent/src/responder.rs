// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response streaming: send the session transcript to the completion
//! service, forward chunks as they arrive, then commit the turn.

use std::sync::Arc;

use futures::StreamExt;
use mneme_core::{ChatMessage, CompletionAdapter, MnemeError, SessionBuffer, Turn};
use mneme_history::HistoryStore;
use mneme_memory::Recollection;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::prompt::render_transcript;

/// Whether a turn is persisted once its response completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// Ordinary prompt, appended to history on success.
    Plain,
    /// `/recall` turn, kept only in the session.
    Recall,
}

/// Result of one streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// The concatenated response text (partial when cancelled).
    pub response: String,
    /// False when the turn was cancelled before the stream ended.
    pub completed: bool,
    /// The history entry written for this turn, if any.
    pub persisted: Option<Turn>,
}

/// Receives output of a turn as it happens.
pub trait ResponseSink: Send {
    /// Called after a recall, before the response starts streaming.
    fn on_recall(&mut self, _recollection: &Recollection) {}

    /// Called once per chunk, in arrival order.
    fn on_chunk(&mut self, chunk: &str);

    /// Called once the turn ends without error, committed or cancelled.
    fn on_finish(&mut self, _outcome: &ResponseOutcome) {}
}

impl ResponseSink for Vec<String> {
    fn on_chunk(&mut self, chunk: &str) {
        self.push(chunk.to_string());
    }
}

pub struct ResponseStreamer {
    completion: Arc<dyn CompletionAdapter>,
    history: HistoryStore,
}

impl ResponseStreamer {
    pub fn new(completion: Arc<dyn CompletionAdapter>, history: HistoryStore) -> Self {
        Self {
            completion,
            history,
        }
    }

    /// Stream a response to the last message in `session`.
    ///
    /// On completion the assistant message is pushed to the session, and for
    /// [`TurnKind::Plain`] the `(prompt, response)` pair is appended to
    /// history. A turn cancelled mid-stream keeps its partial text in the
    /// session but is never persisted; one cancelled before streaming starts
    /// commits nothing and never opens the stream. A stream failure commits
    /// nothing.
    pub async fn respond(
        &self,
        session: &mut SessionBuffer,
        prompt: &str,
        kind: TurnKind,
        sink: &mut dyn ResponseSink,
        cancel: &CancellationToken,
    ) -> Result<ResponseOutcome, MnemeError> {
        // Interrupted before the first token: no reply to commit.
        if cancel.is_cancelled() {
            info!("turn cancelled before streaming, nothing committed");
            let outcome = ResponseOutcome {
                response: String::new(),
                completed: false,
                persisted: None,
            };
            sink.on_finish(&outcome);
            return Ok(outcome);
        }

        let transcript = render_transcript(session.messages());
        let mut stream = self.completion.stream(transcript).await.map_err(as_provider)?;

        let mut response = String::new();
        let mut completed = true;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    completed = false;
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    sink.on_chunk(&chunk);
                    response.push_str(&chunk);
                }
                Some(Err(e)) => return Err(as_provider(e)),
                None => break,
            }
        }

        session.push(ChatMessage::assistant(response.clone()));

        let persisted = match (completed, kind) {
            (true, TurnKind::Plain) => Some(self.history.append(prompt, &response)?),
            (true, TurnKind::Recall) => None,
            (false, _) => {
                info!(chars = response.len(), "response cancelled, turn not persisted");
                None
            }
        };
        debug!(?kind, completed, chars = response.len(), "response finished");

        let outcome = ResponseOutcome {
            response,
            completed,
            persisted,
        };
        sink.on_finish(&outcome);
        Ok(outcome)
    }
}

/// Stream failures surface as provider errors whatever their origin.
fn as_provider(e: MnemeError) -> MnemeError {
    match e {
        MnemeError::Provider { .. } => e,
        other => MnemeError::Provider {
            message: format!("response stream failed: {other}"),
            source: Some(Box::new(other)),
        },
    }
}
