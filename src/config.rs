use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "tree-spotter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix shared by every environment variable the pipeline reads.
pub const ENV_PREFIX: &str = "TREE_SPOTTER_";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,tree_spotter=debug"
    } else {
        "info"
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to initialise client: {0}")]
    Client(String),
}

// ═══════════════════════════════════════════════════════════
// Pipeline settings
// ═══════════════════════════════════════════════════════════

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Model used to read diameters out of message text.
    pub model: String,
    pub model_timeout_secs: u64,
    /// Per-attempt image fetch timeout.
    pub fetch_timeout_ms: u64,
    /// Pause between the first fetch attempt and the retry.
    pub retry_delay_ms: u64,
    /// Images in flight at once; never below 1.
    pub max_concurrency: usize,
    /// Budget for a whole submission.
    pub batch_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            model_timeout_secs: 30,
            fetch_timeout_ms: 1000,
            retry_delay_ms: 100,
            max_concurrency: 8,
            batch_timeout_secs: 120,
        }
    }
}

impl PipelineSettings {
    /// Defaults overridden by any `TREE_SPOTTER_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable
    /// source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = var("OLLAMA_URL") {
            settings.ollama_url = non_empty(key, value)?;
        }
        if let Some((key, value)) = var("MODEL") {
            settings.model = non_empty(key, value)?;
        }
        if let Some((key, value)) = var("MODEL_TIMEOUT_SECS") {
            settings.model_timeout_secs = parse(key, &value)?;
        }
        if let Some((key, value)) = var("FETCH_TIMEOUT_MS") {
            settings.fetch_timeout_ms = parse(key, &value)?;
        }
        if let Some((key, value)) = var("RETRY_DELAY_MS") {
            settings.retry_delay_ms = parse(key, &value)?;
        }
        if let Some((key, value)) = var("MAX_CONCURRENCY") {
            settings.max_concurrency = match parse::<usize>(key.clone(), &value)? {
                0 => return Err(ConfigError::InvalidValue { key, value }),
                n => n,
            };
        }
        if let Some((key, value)) = var("BATCH_TIMEOUT_SECS") {
            settings.batch_timeout_secs = parse(key, &value)?;
        }

        Ok(settings)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

fn parse<T: FromStr>(key: String, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn non_empty(key: String, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue { key, value });
    }
    Ok(trimmed.to_string())
}
