use openrouter_client::ClientError;
use thiserror::Error;

use crate::reply::DecodeError;

/// Errors surfaced by suggestion and translation sessions.
#[derive(Debug, Error)]
pub enum AssistError {
    /// No API key stored or provided; raised before any request is sent
    #[error("OpenRouter API key is not configured")]
    MissingCredential,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistError>;
