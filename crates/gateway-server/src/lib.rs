//! # Gateway Server
//!
//! HTTP server for the ZG Inference Gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - OpenAI-compatible `/v1/chat/completions` and `/v1/models` endpoints
//! - The OpenAI error envelope for every failure
//! - Health, readiness, liveness and Prometheus endpoints
//! - Graceful shutdown on SIGINT/SIGTERM

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
