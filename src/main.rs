mod analysis;
mod config;
mod http;
mod marketplace;
mod metrics;
mod models;
mod pipeline;
mod server;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use config::AppConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{AnalyzeRequest, AnalyzeResponse, ApiError};
use pipeline::{Pipeline, PipelineError, PipelineErrorKind};
use serde_json::json;
use server::Server;
use std::{any::Any, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "seo.api", "server crashed: {err}");
    }
}

async fn run() -> eyre::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let http = http::build_client(&config);
    let pipeline = Pipeline::new(&config, http);
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;
    let state = AppState {
        pipeline,
        openapi: Arc::new(load_openapi()),
        prometheus_handle,
    };

    info!(
        target = "seo.api",
        api_base = %config.api_base,
        competitor_source = ?config.competitor_source,
        listing_fallback = ?config.listing_fallback,
        "configuration loaded"
    );

    let server = Server::bind(config.port, build_app(state, config.body_limit)).await?;
    info!(target = "seo.api", "listening on {}", server.local_addr()?);
    server.serve().await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
}

fn build_app(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_origin(AnyOrigin);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

fn load_openapi() -> serde_json::Value {
    serde_yaml::from_str(include_str!("../docs/openapi.yaml"))
        .unwrap_or_else(|_| json!({"openapi": "3.0.3"}))
}

/// Liveness check.
///
/// - Method: `GET`
/// - Path: `/api/health`
///
/// Returns `{ "status": "OK" }` plus the service name.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "service": "listing-seo-api",
    }))
}

/// Run the keyword-gap analysis for one listing URL.
///
/// - Method: `POST`
/// - Path: `/api/analyze`
/// - Body: `{ "url": string }` (`publicationUrl` also accepted)
/// - Response: the SEO report plus `meta` (analysis id, stage transcript)
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    crate::metrics::inc_requests("/api/analyze");
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(target = "seo.api", rejection = %rejection.body_text(), "unreadable analyze body");
            AnalyzeRequest::default()
        }
    };
    info!(
        target = "seo.api",
        url = request.url.as_deref().unwrap_or(""),
        "analysis requested"
    );
    let response = state.pipeline.run(request).await?;
    Ok(Json(response))
}

async fn openapi_json(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Ok(key) = std::env::var("OPENAPI_KEY") {
        let presented = headers
            .get("X-Docs-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != key {
            let payload = ApiError {
                error: "unauthorized".into(),
                stage: None,
            };
            return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
        }
    }
    Json((*state.openapi).clone()).into_response()
}

async fn metrics_endpoint(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    (
        [("Content-Type", "text/plain; version=0.0.4")],
        state.prometheus_handle.render(),
    )
        .into_response()
}

#[derive(Debug)]
enum AppError {
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Pipeline(err) => {
                let status = match err.kind() {
                    PipelineErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    PipelineErrorKind::Internal => {
                        error!(target = "seo.api", error = %err, "analysis failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let payload = ApiError {
                    error: err.detail().to_string(),
                    stage: Some(err.stage().to_string()),
                };
                (status, Json(payload)).into_response()
            }
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "internal error".to_string());
    error!(target = "seo.api", panic = %message, "handler panicked");
    let payload = ApiError {
        error: message,
        stage: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
