//! API error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::extract::ExtractionError;
use crate::llm::CompletionError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The multipart body had no `bloodReport` file field.
    #[error("No file uploaded")]
    MissingFile,

    /// The upload is not a PDF.
    #[error("Only PDF files are allowed!")]
    UnsupportedMediaType { content_type: String },

    /// The upload exceeds the configured size cap.
    #[error("File too large. Maximum size is {}.", limit_text(.limit_bytes))]
    PayloadTooLarge { limit_bytes: usize },

    /// Per-address quota exhausted for the current window.
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { retry_after_secs: u64 },

    /// No completion credential configured.
    #[error("OpenAI API key is not configured. Please check your environment variables.")]
    ServiceUnconfigured,

    /// The PDF parsed but has no text layer.
    #[error(
        "Error analyzing blood markers: No text could be extracted from the PDF. Please ensure the PDF contains readable text."
    )]
    UnreadablePdf,

    #[error("Error analyzing blood markers: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Error analyzing blood markers: {0}")]
    Completion(#[from] CompletionError),

    #[error("Request timed out")]
    Timeout,

    #[error("Endpoint not found")]
    NotFound,

    /// Anything unexpected; details are logged, never returned.
    #[error("Internal server error")]
    Unhandled(#[source] anyhow::Error),
}

/// Human-readable upload cap: whole megabytes or kilobytes when exact,
/// bytes otherwise.
pub fn format_limit(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

// thiserror hands fields to format args by reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn limit_text(bytes: &usize) -> String {
    format_limit(*bytes)
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile
            | AppError::UnsupportedMediaType { .. }
            | AppError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ServiceUnconfigured
            | AppError::UnreadablePdf
            | AppError::Extraction(_)
            | AppError::Completion(_)
            | AppError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to the client.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            match &self {
                AppError::Unhandled(source) => {
                    tracing::error!(name: "request.failed", error = ?source, "Unhandled error");
                }
                other => {
                    tracing::error!(name: "request.failed", error = %other, "Request failed");
                }
            }
        } else {
            tracing::warn!(
                name: "request.rejected",
                status = status.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let body = Json(ErrorBody {
            error: self.user_message(),
        });

        match self {
            AppError::RateLimited { retry_after_secs } => (
                status,
                [(axum::http::header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
