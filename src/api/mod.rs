//! JSON API mounted under `/api`.

pub mod analyze;
pub mod health;

use axum::{Router, extract::DefaultBodyLimit, routing::{get, post}};

use crate::AppState;
use crate::error::AppError;
use crate::security::rate_limit::rate_limit_middleware;

/// Slack on top of the file cap for multipart boundaries and part headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the `/api` router. Every route, including the fallback, sits
/// behind the per-address rate limiter.
pub fn router(state: &AppState) -> Router<AppState> {
    let body_limit = state.config.limits.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/analyze",
            post(analyze::analyze_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .fallback(api_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

async fn api_not_found() -> AppError {
    AppError::NotFound
}
