//! Persona HTTP API
//!
//! Axum-based HTTP server that collects persona batches and reads the row
//! store back.
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, serde_json::Value)`, so the logic is testable
//! without axum dispatch.
//!
//! Endpoints:
//! - GET  /health    — store identity and server version
//! - GET  /version   — server version info
//! - POST /personas  — submit a batch of persona slots
//! - GET  /personas  — list every stored persona

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use persona_core::{
    submit_batch, BatchReport, BatchWarning, FormState, PersonaConfig, PersonaDraft, RowStore,
    TextGenerator,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn RowStore>,
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// Few-shot text prepended to generation prompts.
    pub context: String,
    pub config: PersonaConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/personas", get(list_handler).post(submit_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(state: HttpState, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Persona HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct SubmitRequest {
    /// Number of slots; defaults to the number of personas sent.
    pub count: Option<usize>,
    #[serde(default)]
    pub personas: Vec<PersonaDraft>,
    #[serde(default)]
    pub generate: bool,
}

fn error_body(msg: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "error": msg.into(),
        "status": "error",
    })
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "store": state.store.describe(),
            "generation": state.generator.as_ref().map(|g| g.name().to_string()),
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "persona/1",
    })
}

/// Inner submit — collects the slots into a form, then runs the batch.
pub async fn submit_inner(state: &HttpState, req: SubmitRequest) -> (StatusCode, serde_json::Value) {
    let count = req.count.unwrap_or(req.personas.len());
    let form = match FormState::from_drafts(count, req.personas) {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, error_body(e.to_string())),
    };

    let generator = match (req.generate, state.generator.as_deref()) {
        (false, _) => None,
        (true, Some(g)) => Some(g),
        (true, None) => {
            return (
                StatusCode::BAD_REQUEST,
                error_body("text generation is not enabled on this server"),
            );
        }
    };

    let start = Instant::now();
    let report = submit_batch(form.drafts(), state.store.as_ref(), generator, &state.context).await;
    let took_ms = start.elapsed().as_millis() as u64;

    let mut body = report_json(&report);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("took_ms".to_string(), serde_json::json!(took_ms));
    }
    (StatusCode::OK, body)
}

/// Inner list — reads every row; an empty store is not an error.
pub async fn list_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    match state.store.read_all().await {
        Ok(rows) if rows.is_empty() => (
            StatusCode::OK,
            serde_json::json!({
                "rows": [],
                "count": 0,
                "message": "No personas saved yet.",
            }),
        ),
        Ok(rows) => (
            StatusCode::OK,
            serde_json::json!({
                "count": rows.len(),
                "rows": rows,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read personas");
            (StatusCode::BAD_GATEWAY, error_body(e.to_string()))
        }
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn submit_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SubmitRequest>,
) -> impl IntoResponse {
    let (status, body) = submit_inner(&state, req).await;
    (status, Json(body))
}

pub async fn list_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = list_inner(&state).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

pub fn warning_json(warning: &BatchWarning) -> serde_json::Value {
    let mut value = serde_json::to_value(warning).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("position".to_string(), serde_json::json!(warning.position()));
        obj.insert("message".to_string(), serde_json::json!(warning.message()));
    }
    value
}

pub fn report_json(report: &BatchReport) -> serde_json::Value {
    serde_json::json!({
        "batch_id": report.batch_id,
        "submitted": report.submitted,
        "saved": report.saved,
        "warnings": report.warnings.iter().map(warning_json).collect::<Vec<_>>(),
        "message": report.message(),
    })
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
