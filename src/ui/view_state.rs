//! Client view state.
//!
//! The upload form and result viewer keep all of their state in one
//! [`ViewState`] record that only changes through [`ViewState::apply`]. The
//! shell embeds the serialized initial state, and the browser script mirrors
//! these transitions one for one.

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisResult, MAX_UPLOAD_BYTES, PDF_MIME_TYPE};
use crate::error::AppError;

/// Which screen is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Upload,
    Analyzing,
    Results,
}

/// Result viewer tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Analysis,
    Recommendations,
    Trends,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Analysis,
        Tab::Recommendations,
        Tab::Trends,
        Tab::Insights,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Tab::Analysis => "analysis",
            Tab::Recommendations => "recommendations",
            Tab::Trends => "trends",
            Tab::Insights => "insights",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Analysis => "Analysis",
            Tab::Recommendations => "Recommendations",
            Tab::Trends => "Trends",
            Tab::Insights => "Insights",
        }
    }
}

/// File picked in the browser, as far as the client can describe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
}

impl SelectedFile {
    /// Client-side pre-validation with the server's limits and messages.
    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        if self.mime_type != PDF_MIME_TYPE {
            return Err(AppError::UnsupportedMediaType {
                content_type: self.mime_type.clone(),
            });
        }
        if self.size > max_bytes {
            return Err(AppError::PayloadTooLarge {
                limit_bytes: max_bytes,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadState {
    pub file: Option<SelectedFile>,
    pub progress: u8,
    pub error: Option<String>,
    pub in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Upload cap the server enforces; survives [`Transition::NewAnalysis`].
    pub upload_limit: usize,
    pub step: Step,
    pub tab: Tab,
    pub upload: UploadState,
    pub bookmarked: bool,
    pub reminder_set: bool,
    pub result: Option<AnalysisResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A file was picked or dropped; validated before it is accepted.
    SelectFile(SelectedFile),
    /// Pre-validation failed; shows the message and drops the selection.
    RejectFile(String),
    ClearFile,
    SubmitStarted,
    Progress(u8),
    Completed(AnalysisResult),
    Failed(String),
    SelectTab(Tab),
    ToggleBookmark,
    ToggleReminder,
    NewAnalysis,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_upload_limit(MAX_UPLOAD_BYTES)
    }
}

impl ViewState {
    pub fn with_upload_limit(upload_limit: usize) -> Self {
        Self {
            upload_limit,
            step: Step::default(),
            tab: Tab::default(),
            upload: UploadState::default(),
            bookmarked: false,
            reminder_set: false,
            result: None,
        }
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::SelectFile(file) => {
                if self.upload.in_flight {
                    return;
                }
                match file.validate(self.upload_limit) {
                    Ok(()) => {
                        self.upload = UploadState {
                            file: Some(file),
                            ..UploadState::default()
                        };
                    }
                    Err(e) => self.apply(Transition::RejectFile(e.user_message())),
                }
            }
            Transition::RejectFile(message) => {
                if !self.upload.in_flight {
                    self.upload.file = None;
                    self.upload.error = Some(message);
                }
            }
            Transition::ClearFile => {
                if !self.upload.in_flight {
                    self.upload = UploadState::default();
                }
            }
            Transition::SubmitStarted => {
                if self.upload.file.is_none() || self.upload.in_flight {
                    return;
                }
                self.upload.in_flight = true;
                self.upload.progress = 0;
                self.upload.error = None;
                self.step = Step::Analyzing;
            }
            Transition::Progress(pct) => {
                if self.upload.in_flight {
                    self.upload.progress = pct.min(100).max(self.upload.progress);
                }
            }
            Transition::Completed(result) => {
                self.upload = UploadState::default();
                self.result = Some(result);
                self.tab = Tab::Analysis;
                self.bookmarked = false;
                self.reminder_set = false;
                self.step = Step::Results;
            }
            Transition::Failed(message) => {
                // Keep the file so the user can retry without re-picking it.
                self.upload.in_flight = false;
                self.upload.progress = 0;
                self.upload.error = Some(message);
                self.step = Step::Upload;
            }
            Transition::SelectTab(tab) => {
                if self.step == Step::Results {
                    self.tab = tab;
                }
            }
            Transition::ToggleBookmark => self.bookmarked = !self.bookmarked,
            Transition::ToggleReminder => self.reminder_set = !self.reminder_set,
            Transition::NewAnalysis => *self = ViewState::with_upload_limit(self.upload_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pdf(size: usize) -> SelectedFile {
        SelectedFile {
            name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size,
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            filename: "report.pdf".to_string(),
            file_size_bytes: 2048,
            analysis_text: "## Key Findings\nLow hemoglobin.".to_string(),
            timestamp_utc: Utc::now(),
        }
    }

    fn submitted() -> ViewState {
        let mut state = ViewState::default();
        state.apply(Transition::SelectFile(pdf(2048)));
        state.apply(Transition::SubmitStarted);
        state
    }

    #[test]
    fn test_rejects_non_pdf_with_server_message() {
        let mut state = ViewState::default();
        state.apply(Transition::SelectFile(SelectedFile {
            name: "scan.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 10,
        }));
        assert!(state.upload.file.is_none());
        assert_eq!(
            state.upload.error.as_deref(),
            Some("Only PDF files are allowed!")
        );
    }

    #[test]
    fn test_size_boundary() {
        let mut state = ViewState::default();
        state.apply(Transition::SelectFile(pdf(MAX_UPLOAD_BYTES)));
        assert!(state.upload.file.is_some());

        state.apply(Transition::SelectFile(pdf(MAX_UPLOAD_BYTES + 1)));
        assert!(state.upload.file.is_none());
        assert_eq!(
            state.upload.error.as_deref(),
            Some("File too large. Maximum size is 10MB.")
        );
    }

    #[test]
    fn test_reject_ignored_while_in_flight() {
        let mut state = submitted();
        state.apply(Transition::RejectFile("Only PDF files are allowed!".to_string()));
        assert!(state.upload.file.is_some());
        assert!(state.upload.error.is_none());
    }

    #[test]
    fn test_configured_limit_is_used() {
        let mut state = ViewState::with_upload_limit(512 * 1024);
        state.apply(Transition::SelectFile(pdf(600 * 1024)));
        assert!(state.upload.file.is_none());
        assert_eq!(
            state.upload.error.as_deref(),
            Some("File too large. Maximum size is 512KB.")
        );

        state.apply(Transition::SelectFile(pdf(512 * 1024)));
        assert!(state.upload.file.is_some());

        state.apply(Transition::NewAnalysis);
        assert_eq!(state.upload_limit, 512 * 1024);
    }

    #[test]
    fn test_submit_requires_file() {
        let mut state = ViewState::default();
        state.apply(Transition::SubmitStarted);
        assert_eq!(state.step, Step::Upload);
        assert!(!state.upload.in_flight);
    }

    #[test]
    fn test_progress_is_clamped_and_monotonic() {
        let mut state = submitted();
        state.apply(Transition::Progress(40));
        state.apply(Transition::Progress(20));
        assert_eq!(state.upload.progress, 40);
        state.apply(Transition::Progress(250));
        assert_eq!(state.upload.progress, 100);
    }

    #[test]
    fn test_failure_keeps_file_for_retry() {
        let mut state = submitted();
        state.apply(Transition::Failed("No file uploaded".to_string()));
        assert_eq!(state.step, Step::Upload);
        assert!(!state.upload.in_flight);
        assert!(state.upload.file.is_some());
        assert_eq!(state.upload.error.as_deref(), Some("No file uploaded"));

        state.apply(Transition::SubmitStarted);
        assert!(state.upload.in_flight);
        assert!(state.upload.error.is_none());
    }

    #[test]
    fn test_completion_shows_results_on_first_tab() {
        let mut state = submitted();
        state.apply(Transition::Completed(result()));
        assert_eq!(state.step, Step::Results);
        assert_eq!(state.tab, Tab::Analysis);
        assert!(state.upload.file.is_none());

        state.apply(Transition::SelectTab(Tab::Trends));
        state.apply(Transition::ToggleBookmark);
        assert_eq!(state.tab, Tab::Trends);
        assert!(state.bookmarked);

        state.apply(Transition::NewAnalysis);
        assert_eq!(state, ViewState::default());
    }

    #[test]
    fn test_tabs_ignored_outside_results() {
        let mut state = ViewState::default();
        state.apply(Transition::SelectTab(Tab::Insights));
        assert_eq!(state.tab, Tab::Analysis);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ViewState::default()).unwrap();
        assert_eq!(json["step"], "upload");
        assert_eq!(json["tab"], "analysis");
        assert_eq!(json["upload"]["inFlight"], false);
        assert_eq!(json["reminderSet"], false);
        assert_eq!(json["uploadLimit"], 10 * 1024 * 1024);
    }
}
