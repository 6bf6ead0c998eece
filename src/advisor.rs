//! Health advisor: prompt construction and the extract → complete pipeline.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{AnalysisResult, UploadedFile};
use crate::error::AppError;
use crate::extract::TextExtractor;
use crate::llm::{CompletionClient, CompletionError, CompletionRequest, Message};

/// Deployed model every analysis runs against.
pub const MODEL: &str = "gpt-4o";
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 2000;

/// Separates the instruction from the extracted report text.
pub const REPORT_MARKER: &str = "\n\nBlood Marker Report:\n";

pub const SYSTEM_PROMPT: &str = "You are a knowledgeable and empathetic health advisor who specializes in \
interpreting blood test results and providing health recommendations in extremely simple language \
that anyone without medical knowledge can understand.";

pub const ANALYSIS_PROMPT: &str = "As a compassionate and knowledgeable health advisor, please analyze the blood marker report \
and provide insights in extremely simple, everyday language. Imagine you're explaining to someone with \
no medical background. Avoid technical jargon, and when you must use a medical term, explain it immediately.

Focus on:
1. Identifying any concerning or out-of-range markers
2. Explaining what these markers mean using simple analogies and everyday examples
3. Suggesting specific lifestyle changes, including:
   - Recommended physical activities that are easy to understand and implement
   - Common, everyday foods to include or avoid (use familiar food names, not nutrients)

Please structure your response in a friendly, conversational manner as if talking to a friend.

Please format your response with clear sections using markdown headings:
- Overall Health Summary
- Key Findings
- Recommendations
- Lifestyle Changes
- Important Notes";

/// The user message sent alongside [`SYSTEM_PROMPT`].
pub fn build_user_message(report_text: &str) -> String {
    format!("{ANALYSIS_PROMPT}{REPORT_MARKER}{report_text}")
}

/// Full completion request for a report's extracted text.
pub fn build_request(report_text: &str) -> CompletionRequest {
    CompletionRequest {
        model: MODEL.to_string(),
        messages: vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_message(report_text)),
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Runs one analysis: extract text, then ask the model about it.
#[derive(Debug, Clone)]
pub struct HealthAdvisor {
    extractor: Arc<dyn TextExtractor>,
    client: Arc<dyn CompletionClient>,
}

impl HealthAdvisor {
    pub fn new(extractor: Arc<dyn TextExtractor>, client: Arc<dyn CompletionClient>) -> Self {
        Self { extractor, client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Whether an upload declared as `content_type` can be analyzed.
    pub fn accepts(&self, content_type: &str) -> bool {
        self.extractor.supports_mime_type(content_type)
    }

    /// Analyze one uploaded report.
    ///
    /// The credential is checked before anything else so an unconfigured
    /// service never parses the document or touches the network.
    pub async fn analyze(&self, file: UploadedFile) -> Result<AnalysisResult, AppError> {
        if !self.client.is_configured() {
            return Err(AppError::ServiceUnconfigured);
        }

        let file_size_bytes = file.size();
        let text = self.extractor.extract(file.data).await?;
        if text.trim().is_empty() {
            return Err(AppError::UnreadablePdf);
        }

        info!(
            name: "analysis.extracted",
            filename = %file.filename,
            extractor = self.extractor.provider_name(),
            chars = text.len(),
            "Report text extracted"
        );

        let analysis_text = self
            .client
            .complete(build_request(&text))
            .await
            .map_err(|e| match e {
                CompletionError::NotConfigured => AppError::ServiceUnconfigured,
                other => AppError::Completion(other),
            })?;

        info!(
            name: "analysis.completed",
            filename = %file.filename,
            bytes = file_size_bytes,
            "Analysis completed"
        );

        Ok(AnalysisResult {
            filename: file.filename,
            file_size_bytes,
            analysis_text,
            timestamp_utc: Utc::now(),
        })
    }
}
