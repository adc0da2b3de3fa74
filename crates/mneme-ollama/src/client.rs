// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama REST API.
//!
//! Provides [`OllamaClient`] which handles request construction, NDJSON
//! streaming, and retry of transient errors.

use std::time::Duration;

use mneme_core::{MnemeError, TextStream};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::stream::parse_ndjson_stream;
use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, GenerateRequest,
    GenerateResponse, TagsResponse,
};

/// Delay before retrying a request that failed with a transient status.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for a single Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// `timeout` bounds each request including the full streamed body.
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self, MnemeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MnemeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/generate` with `stream: false`.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, MnemeError> {
        let mut req = request.clone();
        req.stream = false;
        let response = self.post("/api/generate", &req).await?;
        read_json(response).await
    }

    /// `POST /api/generate` with `stream: true`, returning text fragments.
    pub async fn generate_stream(&self, request: &GenerateRequest) -> Result<TextStream, MnemeError> {
        let mut req = request.clone();
        req.stream = true;
        let response = self.post("/api/generate", &req).await?;
        Ok(parse_ndjson_stream(response.bytes_stream()))
    }

    /// `POST /api/chat` with `stream: false`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, MnemeError> {
        let mut req = request.clone();
        req.stream = false;
        let response = self.post("/api/chat", &req).await?;
        read_json(response).await
    }

    /// `POST /api/embed`.
    pub async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, MnemeError> {
        let response = self.post("/api/embed", request).await?;
        read_json(response).await
    }

    /// `GET /api/tags`: lists the models available on the server.
    pub async fn tags(&self) -> Result<TagsResponse, MnemeError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_body(status, response).await);
        }
        read_json(response).await
    }

    /// Sends a POST, retrying transient statuses up to `max_retries` times.
    ///
    /// Returns the response only when its status is a success.
    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<reqwest::Response, MnemeError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, endpoint, "retrying request after transient error");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(request_failed)?;

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "response received");

            if status.is_success() {
                return Ok(response);
            }

            let error = error_from_body(status, response).await;
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, error = %error, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| MnemeError::provider("request failed after retries")))
    }
}

/// Whether a status is worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

fn request_failed(e: reqwest::Error) -> MnemeError {
    MnemeError::Provider {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Build a provider error from a failed response, preferring Ollama's
/// `{"error": ...}` message over the raw body.
async fn error_from_body(status: StatusCode, response: reqwest::Response) -> MnemeError {
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(api_err) => format!("Ollama API error ({status}): {}", api_err.error),
        Err(_) => format!("Ollama returned {status}: {body}"),
    };
    MnemeError::provider(message)
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, MnemeError> {
    let body = response.text().await.map_err(|e| MnemeError::Provider {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| MnemeError::Provider {
        message: format!("failed to parse Ollama response: {e}"),
        source: Some(Box::new(e)),
    })
}
