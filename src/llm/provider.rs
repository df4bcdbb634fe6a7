//! Upstream completion API client

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{FiestaError, Result};
use crate::llm::types::{ChatMessage, CompletionParams};

/// Why a single model produced no content. The `Display` text is what the
/// caller sees in `ModelResult.error`.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{}", status_message(.status, .body))]
    Status { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

fn status_message(status: &StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        body.to_string()
    }
}

/// Generic LLM provider trait
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Fails when the provider cannot make any call at all, e.g. no credential
    fn ensure_ready(&self) -> Result<()>;

    async fn complete(
        &self,
        model: &str,
        params: &CompletionParams,
    ) -> std::result::Result<String, UpstreamError>;
}

/// OpenAI-compatible aggregator (OpenRouter by default)
pub struct OpenRouterProvider {
    client: Client,
    url: String,
    api_key: Option<String>,
    api_key_name: String,
    referer: String,
    title: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<CompletionChoice>>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_content(self) -> String {
        self.choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}

impl OpenRouterProvider {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(FiestaError::Network)?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.resolve_api_key(),
            api_key_name: config.api_key_name(),
            referer: config.site_url(),
            title: config.site_name(),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenRouterProvider {
    fn ensure_ready(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(FiestaError::MissingApiKey(self.api_key_name.clone())),
        }
    }

    async fn complete(
        &self,
        model: &str,
        params: &CompletionParams,
    ) -> std::result::Result<String, UpstreamError> {
        let request = CompletionRequest {
            model,
            messages: &params.messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body = response.bytes().await?;
        debug!(model, bytes = body.len(), "Upstream responded");
        let parsed: CompletionResponse =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(parsed.into_content())
    }
}
