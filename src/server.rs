use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::advisor::HealthAdvisor;
use crate::api;
use crate::config::{AppConfig, CorsConfig};
use crate::error::AppError;
use crate::security::headers::with_security_headers;
use crate::ui::shell;

/// Build the full application router.
///
/// `/api/*` is handled by [`api::router`], `/static/*` is served from disk and
/// every other GET falls through to the single-page shell.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let timeout_duration = Duration::from_secs(config.limits.request_timeout_secs);

    let app = Router::new()
        .nest("/api", api::router(&state))
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .fallback(spa_fallback)
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => AppError::Timeout.into_response(),
                    }
                }
            },
        ))
        .layer(cors_layer(&config.cors))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                tracing::info_span!(
                    "http.request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .with_state(state);

    with_security_headers(app)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, advisor: HealthAdvisor) -> anyhow::Result<()> {
    let state = AppState::new(Arc::clone(&config), advisor);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        rate_limit_enabled = config.limits.rate_limit_enabled,
        "Server started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Non-API paths: GET and HEAD get the app shell, anything else is a JSON 404.
async fn spa_fallback(State(state): State<AppState>, method: Method) -> Response {
    if method == Method::GET || method == Method::HEAD {
        Html(shell::render_index(state.config.limits.max_upload_bytes)).into_response()
    } else {
        AppError::NotFound.into_response()
    }
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::Unhandled(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
