//! HTTP API for Emblem
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /express - Content → rendering (expression + slots, or placeholder)
//! - POST /diagnose - Content → diagnostics
//! - POST /bind - Validate an outbound object against the contract

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::binding::Binding;
use crate::core::pipeline::Pipeline;
use crate::types::{ContentInput, Diagnostics, Rendering};

/// App state
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub hash_algorithm: String,
    pub detectors: Vec<String>,
}

/// Contract violation response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the API router
pub fn create_router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/health", get(health))
        .route("/express", post(express))
        .route("/diagnose", post(diagnose))
        .route("/bind", post(bind))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        hash_algorithm: crate::HASH_ALGORITHM.to_string(),
        detectors: state
            .pipeline
            .registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Run the pipeline off the async executor
async fn express(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ContentInput>,
) -> Result<Json<Rendering>, StatusCode> {
    let rendering = tokio::task::spawn_blocking(move || state.pipeline.process(&input))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(rendering))
}

async fn diagnose(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ContentInput>,
) -> Result<Json<Diagnostics>, StatusCode> {
    let diagnostics = tokio::task::spawn_blocking(move || state.pipeline.diagnose(&input))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(diagnostics))
}

/// 200 with the normalized binding, 422 with the violation
async fn bind(Json(value): Json<Value>) -> Response {
    match Binding::from_value(&value) {
        Ok(binding) => (StatusCode::OK, Json(binding)).into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: err.to_string() }),
        )
            .into_response(),
    }
}

/// Run the API server
pub async fn run_server(addr: &str, pipeline: Pipeline) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "emblem API listening");
    println!("◆ Emblem API running on {}", addr);
    println!("  GET  /health    - Health check");
    println!("  POST /express   - Content → rendering");
    println!("  POST /diagnose  - Content → diagnostics");
    println!("  POST /bind      - Validate outbound contract");
    axum::serve(listener, router).await?;
    Ok(())
}
