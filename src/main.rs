//! Health advisor server.
//!
//! Entry point: loads configuration, wires the extractor and completion
//! client, and serves the API and client shell.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::map_err_ignore)]
#![allow(clippy::manual_let_else)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use health_advisor::advisor::HealthAdvisor;
use health_advisor::config::AppConfig;
use health_advisor::extract::PdfExtractProvider;
use health_advisor::llm::ChatCompletionsClient;
use health_advisor::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present); the parent directory is checked too so a
    // shared file next to the client works. Results are reported once
    // tracing is up, since .env may set RUST_LOG.
    let dotenv_results = [dotenvy::dotenv(), dotenvy::from_filename("../.env")];

    init_tracing();

    for result in dotenv_results {
        match result {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "Failed to load .env file"),
        }
    }

    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);
    let settings = config.llm_settings();

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        provider = ?settings.provider,
        configured = settings.api_key.is_some(),
        "LLM configuration loaded"
    );

    let client =
        ChatCompletionsClient::new(settings).context("Failed to build completion client")?;
    let advisor = HealthAdvisor::new(Arc::new(PdfExtractProvider::new()), Arc::new(client));
    if !advisor.is_configured() {
        warn!(
            name: "llm.unconfigured",
            "No API key configured; analysis requests will fail until OPENAI_API_KEY is set"
        );
    }

    server::start_server(config, advisor).await
}

/// Initialize tracing (M-LOG-STRUCTURED). `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
