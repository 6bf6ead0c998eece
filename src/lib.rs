//! Blood report health advisor.
//!
//! Accepts a PDF blood marker report, extracts its text, asks a hosted chat
//! completion model for a plain-language interpretation, and returns it as
//! JSON. A single-page client for uploading and reading results is served
//! from the same process.
//!
//! # Modules
//!
//! - [`advisor`]: prompt construction and the extract → complete pipeline
//! - [`api`]: `/api` routes
//! - [`extract`]: PDF text extraction
//! - [`llm`]: chat completion client
//! - [`security`]: rate limiting and response headers
//! - [`ui`]: upload form and result viewer

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod advisor;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod llm;
pub mod security;
pub mod server;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use crate::advisor::HealthAdvisor;
use crate::config::AppConfig;
use crate::security::rate_limit::FixedWindowRateLimiter;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Extraction and completion pipeline.
    pub advisor: HealthAdvisor,
    /// Per-address limiter for `/api` routes.
    pub rate_limiter: Arc<FixedWindowRateLimiter>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, advisor: HealthAdvisor) -> Self {
        let rate_limiter = Arc::new(FixedWindowRateLimiter::new(
            config.limits.rate_limit_max,
            Duration::from_secs(config.limits.rate_limit_window_secs),
        ));
        Self {
            advisor,
            rate_limiter,
            config,
        }
    }
}
