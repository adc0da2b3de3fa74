// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process conversation buffer for the live session.

use crate::types::ChatMessage;

/// Ordered, append-only list of messages for the current run.
///
/// Nothing here is persisted; the buffer is dropped with the session that
/// owns it. The first entry is expected to be the system prompt.
#[derive(Debug, Clone, Default)]
pub struct SessionBuffer {
    messages: Vec<ChatMessage>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
