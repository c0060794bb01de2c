//! Route definitions for the gateway API.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use gateway_core::GatewayError;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{error::ApiError, handlers, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let request_timeout = server.request_timeout;
    let cors_enabled = server.cors_enabled;

    let router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // OpenAI-compatible endpoints
        .nest("/v1", openai_routes())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    middleware_error(&err, request_timeout)
                }))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let router = if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Render middleware failures in the OpenAI error envelope
fn middleware_error(err: &BoxError, request_timeout: Duration) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::from(GatewayError::timeout(request_timeout))
    } else {
        ApiError::from(GatewayError::internal(err.to_string()))
    }
}

/// OpenAI-compatible API routes
fn openai_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/completions", post(handlers::chat_completion))
        .route("/models", get(handlers::list_models))
        // Model ids may contain '/', e.g. "phala/deepseek-r1-70b"
        .route("/models/*model_id", get(handlers::get_model))
}
