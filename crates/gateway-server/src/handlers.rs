//! HTTP request handlers for the gateway API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use gateway_core::{ChatCompletionRequest, ChatCompletionResponse, ModelObject, ModelsResponse};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    error::ApiError,
    extractors::{JsonBody, RequestId},
    state::AppState,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Ready status
    pub ready: bool,
    /// Reason if not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Cached marketplace services
    pub services: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let resolver = state.orchestrator.resolver();
    let services = resolver.service_count();

    if resolver.is_ready() {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                reason: None,
                services,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                reason: Some("service directory not loaded".to_string()),
                services,
            }),
        )
    }
}

/// Liveness check endpoint
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.gather();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}

/// List models endpoint (OpenAI compatible)
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let created = chrono::Utc::now().timestamp();
    let data = state
        .orchestrator
        .list_models()
        .await?
        .into_iter()
        .map(|m| ModelObject::new(m.id, m.provider, created))
        .collect();

    Ok(Json(ModelsResponse::new(data)))
}

/// Get model endpoint
#[instrument(skip(state))]
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelObject>, ApiError> {
    let model = state.orchestrator.get_model(&model_id).await?;
    Ok(Json(ModelObject::new(
        model.id,
        model.provider,
        chrono::Utc::now().timestamp(),
    )))
}

/// Chat completion request (OpenAI compatible)
///
/// Dropping the handler future (client disconnect or request timeout)
/// cancels the orchestration, so no fee is settled for an abandoned request.
#[instrument(skip(state, body), fields(request_id = %request_id, model = %body.model))]
pub async fn chat_completion(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    JsonBody(body): JsonBody<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    debug!(messages = body.messages.len(), "Processing chat completion request");

    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let result = state
        .orchestrator
        .complete_with_cancellation(&body, &token)
        .await;
    guard.disarm();

    let completion = result?;
    Ok(Json(completion.into_response(chrono::Utc::now().timestamp())))
}
