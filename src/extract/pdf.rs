//! PDF text extraction backed by `pdf-extract`.
//!
//! `pdf-extract` is synchronous and can panic on malformed input, so each call
//! runs on the blocking pool inside `catch_unwind`.

use async_trait::async_trait;
use axum::body::Bytes;
use std::panic::{self, AssertUnwindSafe};

use super::provider::{ExtractionError, TextExtractor};
use crate::domain::PDF_MIME_TYPE;

/// Local PDF text extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractProvider;

impl PdfExtractProvider {
    pub fn new() -> Self {
        Self
    }
}

fn extract_blocking(data: &[u8]) -> Result<String, ExtractionError> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Malformed(format!(
            "Failed to parse PDF: {e}"
        ))),
        Err(_) => Err(ExtractionError::Malformed(
            "Failed to parse PDF: malformed document".to_string(),
        )),
    }
}

#[async_trait]
impl TextExtractor for PdfExtractProvider {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || extract_blocking(&data))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        mime_type == PDF_MIME_TYPE
    }

    fn provider_name(&self) -> &'static str {
        "pdf-extract"
    }
}
