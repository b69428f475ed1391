//! Streaming chat-completions client for OpenRouter-compatible APIs.
//!
//! The client only opens the stream. Framing the body into events is done by
//! [`ChunkBuffer`] (via [`EventStream`]); making sense of the payloads is the
//! caller's job.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use openrouter_client::{ChatRequest, Message, OpenRouterClient, SecretString, StreamEvent};
//!
//! let client = OpenRouterClient::new();
//! let key = SecretString::new(std::env::var("OPENROUTER_API_KEY")?);
//!
//! let mut events = client
//!     .chat_completion_stream(&key, ChatRequest::new("anthropic/claude-3-opus:beta")
//!         .message(Message::user("Hello!")))
//!     .await?;
//!
//! while let Some(event) = events.next().await {
//!     if let StreamEvent::Data(payload) = event? {
//!         println!("{payload}");
//!     }
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod sse;
pub mod streaming;
pub mod types;

pub use credentials::SecretString;
pub use error::{ClientError, Result};
pub use sse::{ChunkBuffer, StreamEvent};
pub use streaming::EventStream;
pub use types::*;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Anything that can open a streaming chat completion.
///
/// Implemented by [`OpenRouterClient`]; tests substitute canned streams.
#[async_trait]
pub trait ChatStreamer: Send + Sync {
    async fn stream_chat(&self, api_key: &SecretString, request: ChatRequest)
        -> Result<EventStream>;
}

/// HTTP client for the chat completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    base_url: String,
}

impl Default for OpenRouterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenRouterClient {
    /// Create a client pointed at the public API.
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (proxies, self-hosted gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Completions endpoint URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Streaming chat completion.
    ///
    /// Returns once response headers arrive; the body is consumed lazily
    /// through the returned [`EventStream`]. Failures are not retried.
    pub async fn chat_completion_stream(
        &self,
        api_key: &SecretString,
        request: ChatRequest,
    ) -> Result<EventStream> {
        if api_key.is_blank() {
            return Err(ClientError::Config("API key is empty".into()));
        }

        let body = request
            .to_stream_body()
            .map_err(|e| ClientError::Parse(format!("Failed to serialize request: {}", e)))?;

        debug!(model = %request.model, url = %self.completions_url(), "Opening completion stream");

        let response = self
            .http_client
            .post(self.completions_url())
            .header(header::AUTHORIZATION, api_key.bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Streaming request failed");
                ClientError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Streaming API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(EventStream::from_response(response.bytes_stream()))
    }
}

#[async_trait]
impl ChatStreamer for OpenRouterClient {
    async fn stream_chat(
        &self,
        api_key: &SecretString,
        request: ChatRequest,
    ) -> Result<EventStream> {
        self.chat_completion_stream(api_key, request).await
    }
}
