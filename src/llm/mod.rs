//! Completion client traits and implementations.
//!
//! The analyze route needs exactly one thing from a hosted model: a single,
//! non-streaming chat completion. [`CompletionClient`] is that seam; the
//! production implementation is [`ChatCompletionsClient`], which speaks the
//! `OpenAI` Chat Completions wire format to `OpenAI`, Azure `OpenAI`, or any
//! compatible endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use health_advisor::llm::{ChatCompletionsClient, CompletionClient, CompletionRequest, Message};
//!
//! let client = ChatCompletionsClient::new(config.llm_settings())?;
//! let text = client
//!     .complete(CompletionRequest {
//!         model: "gpt-4o".to_string(),
//!         messages: vec![Message::system("..."), Message::user("...")],
//!         temperature: 0.7,
//!         max_tokens: 2000,
//!     })
//!     .await?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsClient;
pub use provider::Provider;

use std::time::Duration;

/// Completion API connection settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the API (e.g., `https://my-resource.openai.azure.com`).
    pub base_url: String,
    /// API key. `None` means the service is unconfigured.
    pub api_key: Option<String>,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
    /// Per-request timeout for the upstream call.
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A single chat completion request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// System message followed by the user message.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Response length cap in tokens.
    pub max_tokens: u32,
}

/// Errors from the completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// No credential configured; raised before any network call.
    #[error("completion API key is not configured")]
    NotConfigured,

    /// The endpoint answered with a non-success status.
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response had no usable completion text.
    #[error("completion API returned an empty response")]
    EmptyResponse,

    /// Transport-level failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Trait for single-shot completion clients.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync + std::fmt::Debug {
    /// Whether a credential is available. Checked before any request.
    fn is_configured(&self) -> bool;

    /// Run one completion and return its text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no content.
    async fn complete(&self, req: CompletionRequest) -> Result<String, CompletionError>;
}
