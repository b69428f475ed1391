use anyhow::Result;
use dotenvy::dotenv;
use openrouter_client::{SecretString, DEFAULT_BASE_URL};
use std::env;
use std::path::PathBuf;

/// Model used when `ASSISTANT_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "anthropic/claude-3-opus:beta";

/// Settings file used when `ASSISTANT_SETTINGS_PATH` is not set.
pub const DEFAULT_SETTINGS_PATH: &str = "assistant-settings.json";

/// Process configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Overrides the stored credential when set
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub settings_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new),
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: env::var("ASSISTANT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            settings_path: env::var("ASSISTANT_SETTINGS_PATH")
                .unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string())
                .into(),
        })
    }
}
