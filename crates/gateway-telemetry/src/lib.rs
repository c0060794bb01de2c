//! # Gateway Telemetry
//!
//! Observability for the ZG Inference Gateway.
//!
//! This crate provides:
//! - Structured logging setup
//! - Prometheus metrics for completions, attempts, and fee settlements

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, subscriber, LoggingConfig, LoggingError};
pub use metrics::{AttemptOutcome, Metrics, MetricsConfig, MetricsError};
