//! Fan-out of one conversation to many models

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::{FiestaError, Result};
use crate::llm::provider::{LlmProvider, UpstreamError};
use crate::llm::types::{CompletionParams, DispatchRequest, DispatchResponse, ModelResult};

/// Sends the same conversation to every requested model and gathers one
/// result per model.
///
/// Per-model failures are data, not errors: only validation, a missing
/// credential, or a crashed task fail the whole dispatch. Dropping the
/// future returned by [`Dispatcher::dispatch`] aborts all in-flight calls.
pub struct Dispatcher {
    provider: Arc<dyn LlmProvider>,
    default_max_tokens: u32,
    default_temperature: f32,
    max_concurrency: Option<usize>,
    model_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &DispatchConfig) -> Self {
        Self {
            provider,
            default_max_tokens: config.default_max_tokens,
            default_temperature: config.default_temperature,
            max_concurrency: config.max_concurrency.filter(|&n| n > 0),
            model_timeout: config.model_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Override the per-model deadline
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    /// Whether the upstream credential is present
    pub fn is_ready(&self) -> bool {
        self.provider.ensure_ready().is_ok()
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse> {
        let params = self.prepare(&request)?;
        self.provider.ensure_ready()?;

        let models = request.models;
        info!(
            models = models.len(),
            messages = params.messages.len(),
            max_tokens = params.max_tokens,
            "Dispatching conversation"
        );

        let params = Arc::new(params);
        let limit = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks = JoinSet::new();

        for (index, model) in models.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let params = Arc::clone(&params);
            let limit = limit.clone();
            let deadline = self.model_timeout;

            tasks.spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let result = call_model(provider.as_ref(), &model, &params, deadline).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<ModelResult>> = vec![None; models.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| {
                FiestaError::Internal(format!("model task did not complete: {}", e))
            })?;
            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FiestaError::Internal("model task produced no result".to_string()))?;

        let failed = results.iter().filter(|r| r.is_error()).count();
        info!(models = results.len(), failed, "Dispatch complete");

        Ok(DispatchResponse { results })
    }

    /// Validate the request and apply generation defaults
    fn prepare(&self, request: &DispatchRequest) -> Result<CompletionParams> {
        if request.models.is_empty() {
            return Err(FiestaError::validation("models[] required"));
        }
        if request.messages.is_empty() {
            return Err(FiestaError::validation("messages[] required"));
        }
        if request.max_tokens == Some(0) {
            return Err(FiestaError::validation("maxTokens must be a positive integer"));
        }
        if request.temperature.is_some_and(|t| !t.is_finite()) {
            return Err(FiestaError::validation("temperature must be a finite number"));
        }

        Ok(CompletionParams {
            messages: request.messages.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request.temperature.unwrap_or(self.default_temperature),
        })
    }
}

async fn call_model(
    provider: &dyn LlmProvider,
    model: &str,
    params: &CompletionParams,
    deadline: Option<Duration>,
) -> ModelResult {
    debug!(model, "Calling upstream");

    let outcome = match deadline {
        Some(limit) => tokio::time::timeout(limit, provider.complete(model, params))
            .await
            .unwrap_or_else(|_| Err(UpstreamError::TimedOut(limit))),
        None => provider.complete(model, params).await,
    };

    match outcome {
        Ok(content) => ModelResult::success(model, content),
        Err(error) => {
            warn!(model, %error, "Model call failed");
            ModelResult::failure(model, error.to_string())
        }
    }
}
