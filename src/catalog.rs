//! Model catalog shown to the UI picker
//!
//! The dispatcher treats model identifiers as opaque strings and never
//! checks them against this list.

use serde::{Deserialize, Serialize};

/// Number of models preselected when the UI has no saved choice
pub const DEFAULT_SELECTION: usize = 3;

/// A model the UI can offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Upstream slug, e.g. "openai/gpt-4o-mini"
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub description: String,
}

impl ModelInfo {
    fn new(id: &str, name: &str, provider: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            description: description.to_string(),
        }
    }
}

/// Built-in catalog used when the config has no `[[catalog]]` entries
pub fn default_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo::new(
            "openai/gpt-4o-mini",
            "GPT-4o mini",
            "OpenAI",
            "Fast, inexpensive general model",
        ),
        ModelInfo::new(
            "anthropic/claude-3.5-sonnet",
            "Claude 3.5 Sonnet",
            "Anthropic",
            "Strong at writing and code",
        ),
        ModelInfo::new(
            "google/gemini-flash-1.5",
            "Gemini 1.5 Flash",
            "Google",
            "Long context, low latency",
        ),
        ModelInfo::new(
            "meta-llama/llama-3.1-70b-instruct",
            "Llama 3.1 70B",
            "Meta",
            "Open-weights instruction model",
        ),
        ModelInfo::new(
            "mistralai/mistral-large",
            "Mistral Large",
            "Mistral",
            "",
        ),
        ModelInfo::new(
            "deepseek/deepseek-chat",
            "DeepSeek Chat",
            "DeepSeek",
            "",
        ),
    ]
}

/// Read-only view over the configured models
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<ModelInfo>,
}

impl Catalog {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        let models = if models.is_empty() {
            default_models()
        } else {
            models
        };
        Self { models }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Identifiers preselected for a fresh session
    pub fn default_selection(&self) -> Vec<String> {
        self.models
            .iter()
            .take(DEFAULT_SELECTION)
            .map(|m| m.id.clone())
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_models())
    }
}
