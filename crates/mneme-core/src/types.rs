// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mneme pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external service an adapter wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Completion,
    Retrieval,
    Embedding,
}

// --- Persisted history ---

/// One persisted (prompt, response) pair.
///
/// `id` is assigned as `count + 1` at write time and may be reused after
/// deletions, so it is only unique among the turns stored at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    pub prompt: String,
    pub response: String,
}

impl Turn {
    /// Text indexed for similarity search: prompt and response joined by a space.
    pub fn document_text(&self) -> String {
        format!("{} {}", self.prompt, self.response)
    }
}

// --- Session messages ---

/// Author of a session message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Uppercase tag used when rendering a transcript (`USER`, `ASSISTANT`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "SYSTEM",
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

/// A role-tagged message in the session conversation buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// --- Completion ---

/// Input for a single-shot completion: either a raw prompt or a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    Text(String),
    Messages(Vec<ChatMessage>),
}

// --- Retrieval ---

/// A similarity search hit. Lower `distance` means a closer match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub content: String,
    pub distance: f32,
}

impl ScoredDocument {
    pub fn new(content: impl Into<String>, distance: f32) -> Self {
        Self {
            content: content.into(),
            distance,
        }
    }
}

// --- Embedding ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector is returned per entry.
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One embedding per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of each embedding.
    pub dimensions: usize,
}
