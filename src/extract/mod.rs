//! Document text extraction.
//!
//! This module provides the [`TextExtractor`] seam used by the advisor to turn
//! uploaded document bytes into plain text.
//!
//! # Providers
//!
//! - [`PdfExtractProvider`] - local extraction via the `pdf-extract` crate
//!
//! # Usage
//!
//! ```rust,ignore
//! use health_advisor::extract::{PdfExtractProvider, TextExtractor};
//!
//! let extractor = PdfExtractProvider::new();
//! let text = extractor.extract(bytes).await?;
//! ```

mod pdf;
mod provider;

pub use pdf::PdfExtractProvider;
pub use provider::{ExtractionError, TextExtractor};
