//! Request-scoped domain types. Nothing here outlives a single request.

use axum::body::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// MIME type accepted for analysis.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Default upload cap (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the report.
pub const UPLOAD_FIELD: &str = "bloodReport";

/// A validated upload held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Outcome of one successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub filename: String,
    pub file_size_bytes: usize,
    /// Markdown text returned by the model.
    pub analysis_text: String,
    pub timestamp_utc: DateTime<Utc>,
}

/// Wire shape of `POST /api/analyze` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub filename: String,
    pub file_size: usize,
    pub analysis: String,
    /// RFC 3339, UTC, millisecond precision.
    pub timestamp: String,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            success: true,
            filename: result.filename,
            file_size: result.file_size_bytes,
            analysis: result.analysis_text,
            timestamp: result
                .timestamp_utc
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_shape() {
        let result = AnalysisResult {
            filename: "report.pdf".to_string(),
            file_size_bytes: 1234,
            analysis_text: "## Key Findings".to_string(),
            timestamp_utc: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(AnalyzeResponse::from(result)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "filename": "report.pdf",
                "fileSize": 1234,
                "analysis": "## Key Findings",
                "timestamp": "2026-03-01T12:30:00.000Z"
            })
        );
    }
}
