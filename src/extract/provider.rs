//! Core trait and types for text extraction providers.

use async_trait::async_trait;
use axum::body::Bytes;

/// Errors that can occur during text extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The document could not be parsed.
    #[error("{0}")]
    Malformed(String),

    /// The extraction task failed to run to completion.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Trait for text extraction providers.
///
/// Implementors take the raw bytes of an uploaded document and return its
/// text layer. An empty string is a valid result; deciding whether it is
/// usable is left to the caller.
#[async_trait]
pub trait TextExtractor: Send + Sync + std::fmt::Debug {
    /// Extract plain text from document bytes.
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError>;

    /// Check if this extractor supports the given MIME type.
    fn supports_mime_type(&self, mime_type: &str) -> bool;

    /// Get the provider name for logging and debugging.
    fn provider_name(&self) -> &'static str;
}
