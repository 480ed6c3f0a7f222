// src/config.rs
//! Runtime configuration for the relay.
//! Built once at startup and shared read-only with every handler.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_FEEDBACK_PATH: &str = "feedback.jsonl";
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set in environment variables")]
    MissingApiKey,
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
    #[error("FRONTEND_URL is not a valid origin: {0:?}")]
    InvalidOrigin(String),
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub allowed_origin: HeaderValue,
    pub port: u16,
    pub upstream_base: String,
    pub upstream_timeout: Duration,
    pub static_dir: Option<PathBuf>,
    pub feedback_path: PathBuf,
}

// Keeps the credential out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("allowed_origin", &self.allowed_origin)
            .field("port", &self.port)
            .field("upstream_base", &self.upstream_base)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("static_dir", &self.static_dir)
            .field("feedback_path", &self.feedback_path)
            .finish()
    }
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let origin = get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        let allowed_origin = HeaderValue::from_str(origin.trim_end_matches('/'))
            .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))?;

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            allowed_origin,
            port,
            upstream_base: get("OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE.to_string()),
            upstream_timeout: UPSTREAM_TIMEOUT,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            feedback_path: get("FEEDBACK_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FEEDBACK_PATH)),
        })
    }

    /// Config pointing at a given upstream, with defaults for everything else.
    pub fn for_upstream(api_key: impl Into<String>, upstream_base: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            allowed_origin: HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN),
            port: DEFAULT_PORT,
            upstream_base: upstream_base.into(),
            upstream_timeout: UPSTREAM_TIMEOUT,
            static_dir: None,
            feedback_path: PathBuf::from(DEFAULT_FEEDBACK_PATH),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.upstream_base.trim_end_matches('/'))
    }
}
