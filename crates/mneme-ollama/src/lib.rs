// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapters for Mneme.
//!
//! [`OllamaProvider`] implements [`CompletionAdapter`] over `/api/generate`
//! and `/api/chat`; [`OllamaEmbedder`] implements [`EmbeddingAdapter`] over
//! `/api/embed`. Both share an [`OllamaClient`].

pub mod client;
pub mod stream;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use mneme_config::model::OllamaConfig;
use mneme_core::{
    AdapterType, CompletionAdapter, CompletionContext, EmbeddingAdapter, EmbeddingInput,
    EmbeddingOutput, HealthStatus, MnemeError, PluginAdapter, TextStream,
};
use tracing::{debug, info};

pub use client::OllamaClient;

use crate::types::{ApiMessage, ChatRequest, EmbedRequest, GenerateRequest, RequestOptions};

/// Builds the shared HTTP client from the `[ollama]` config section.
pub fn client_from_config(config: &OllamaConfig) -> Result<OllamaClient, MnemeError> {
    OllamaClient::new(
        &config.base_url,
        Duration::from_secs(config.timeout_secs),
        config.max_retries,
    )
}

/// Reports whether `model` is pulled on the server behind `client`.
async fn model_health(client: &OllamaClient, model: &str) -> Result<HealthStatus, MnemeError> {
    let tags = match client.tags().await {
        Ok(tags) => tags,
        Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
    };

    // Tags carry an explicit ":latest" when the config names the bare model.
    let available = tags
        .models
        .iter()
        .any(|m| m.name == model || m.name.strip_suffix(":latest") == Some(model));

    if available {
        Ok(HealthStatus::Healthy)
    } else {
        Ok(HealthStatus::Degraded(format!(
            "model `{model}` is not available on {}",
            client.base_url()
        )))
    }
}

/// Completion adapter backed by an Ollama chat model.
pub struct OllamaProvider {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self, MnemeError> {
        let client = client_from_config(config)?;
        info!(model = config.chat_model, base_url = config.base_url, "Ollama provider initialized");
        Ok(Self::with_client(client, config.chat_model.clone(), config.temperature))
    }

    pub fn with_client(client: OllamaClient, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn options(&self) -> RequestOptions {
        RequestOptions {
            temperature: self.temperature,
        }
    }

    fn generate_request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
            options: self.options(),
        }
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
        model_health(&self.client, &self.model).await
    }

    async fn shutdown(&self) -> Result<(), MnemeError> {
        debug!("Ollama provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for OllamaProvider {
    async fn invoke(&self, context: CompletionContext) -> Result<String, MnemeError> {
        match context {
            CompletionContext::Text(prompt) => {
                let response = self.client.generate(&self.generate_request(prompt)).await?;
                Ok(response.response)
            }
            CompletionContext::Messages(messages) => {
                let request = ChatRequest {
                    model: self.model.clone(),
                    messages: messages.iter().map(ApiMessage::from).collect(),
                    stream: false,
                    options: self.options(),
                };
                let response = self.client.chat(&request).await?;
                Ok(response.message.content)
            }
        }
    }

    async fn stream(&self, prompt: String) -> Result<TextStream, MnemeError> {
        self.client
            .generate_stream(&self.generate_request(prompt))
            .await
    }
}

/// Embedding adapter backed by an Ollama embedding model.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &OllamaConfig) -> Result<Self, MnemeError> {
        let client = client_from_config(config)?;
        info!(model = config.embedding_model, "Ollama embedder initialized");
        Ok(Self::with_client(client, config.embedding_model.clone()))
    }

    pub fn with_client(client: OllamaClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama-embed"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
        model_health(&self.client, &self.model).await
    }

    async fn shutdown(&self) -> Result<(), MnemeError> {
        debug!("Ollama embedder shutting down");
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemeError> {
        let expected = input.texts.len();
        if expected == 0 {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: 0,
            });
        }

        let request = EmbedRequest {
            model: self.model.clone(),
            input: input.texts,
        };
        let response = self.client.embed(&request).await.map_err(|e| MnemeError::Embedding {
            message: format!("embedding request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        if response.embeddings.len() != expected {
            return Err(MnemeError::Embedding {
                message: format!(
                    "expected {expected} embeddings, got {}",
                    response.embeddings.len()
                ),
                source: None,
            });
        }

        let dimensions = response.embeddings.first().map_or(0, Vec::len);
        Ok(EmbeddingOutput {
            embeddings: response.embeddings,
            dimensions,
        })
    }
}
