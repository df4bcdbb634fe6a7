//! Configuration management for Fiesta

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::{default_models, ModelInfo};
use crate::error::{FiestaError, Result};

/// Env override for the `HTTP-Referer` identification header
pub const SITE_URL_ENV: &str = "FIESTA_SITE_URL";
/// Env override for the `X-Title` identification header
pub const SITE_NAME_ENV: &str = "FIESTA_SITE_NAME";

const FALLBACK_SITE_URL: &str = "http://localhost:3000";
const FALLBACK_SITE_NAME: &str = "AI Fiesta";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Upstream completion API
    pub upstream: UpstreamConfig,

    /// Fan-out behaviour
    pub dispatch: DispatchConfig,

    /// Models offered to the UI picker
    pub catalog: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:8080"
    pub bind: String,

    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base URL; `/chat/completions` is appended
    pub endpoint: String,

    /// API key (can be env var reference like $OPENROUTER_API_KEY)
    pub api_key: String,

    /// Value sent as `HTTP-Referer`
    pub referer: String,

    /// Value sent as `X-Title`
    pub title: String,

    /// Whole-request timeout for each upstream call. Unset keeps the client default.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Used when a request carries no `maxTokens`
    pub default_max_tokens: u32,

    /// Used when a request carries no `temperature`
    pub default_temperature: f32,

    /// Cap on in-flight upstream calls per dispatch. Unset means one call per model at once.
    pub max_concurrency: Option<usize>,

    /// Deadline for a single model's call
    pub model_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            dispatch: DispatchConfig::default(),
            catalog: default_models(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cors_origins: vec![FALLBACK_SITE_URL.to_string()],
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            api_key: "$OPENROUTER_API_KEY".to_string(),
            referer: FALLBACK_SITE_URL.to_string(),
            title: FALLBACK_SITE_NAME.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_max_tokens: 1024,
            default_temperature: 0.7,
            max_concurrency: None,
            model_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load config from file or create default
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                FiestaError::Config(format!("{}: {}", config_path.display(), e))
            })?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FiestaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fiesta")
            .join("config.toml")
    }
}

impl UpstreamConfig {
    /// Resolve API key from config (handles env var references)
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(var) = self.api_key.strip_prefix('$') {
            std::env::var(var).ok().filter(|key| !key.is_empty())
        } else if self.api_key.is_empty() {
            None
        } else {
            Some(self.api_key.clone())
        }
    }

    /// Human-readable name of the credential source, used in error messages
    pub fn api_key_name(&self) -> String {
        match self.api_key.strip_prefix('$') {
            Some(var) if !var.is_empty() => var.to_string(),
            _ => "upstream API key".to_string(),
        }
    }

    /// Referer header value: env, then config, then fallback
    pub fn site_url(&self) -> String {
        env_or(SITE_URL_ENV, &self.referer, FALLBACK_SITE_URL)
    }

    /// Title header value: env, then config, then fallback
    pub fn site_name(&self) -> String {
        env_or(SITE_NAME_ENV, &self.title, FALLBACK_SITE_NAME)
    }
}

fn env_or(var: &str, configured: &str, fallback: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| Some(configured.to_string()).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}
