use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::session::SessionTimings;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// Usage counter lives in Redis when set, otherwise in `usage_store_path`.
    pub redis_url: Option<String>,
    pub usage_store_path: PathBuf,
    pub min_processing_ms: u64,
    pub reset_transition_ms: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            redis_url: optional_env("REDIS_URL"),
            usage_store_path: optional_env("USAGE_STORE_PATH")
                .unwrap_or_else(|| "data/usage.json".to_string())
                .into(),
            min_processing_ms: parse_env("MIN_PROCESSING_MS", 1500)?,
            reset_transition_ms: parse_env("RESET_TRANSITION_MS", 500)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            min_processing: Duration::from_millis(self.min_processing_ms),
            reset_transition: Duration::from_millis(self.reset_transition_ms),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
