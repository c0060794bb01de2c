//! Error types for the gateway.
//!
//! `GatewayError` is the single taxonomy that crosses crate boundaries. Each
//! variant knows how it is surfaced through the OpenAI-compatible error
//! envelope (`type`, `param`, `code`, HTTP status).

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// OpenAI error type for caller mistakes
pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";

/// OpenAI error type for everything the caller cannot fix
pub const SERVER_ERROR: &str = "server_error";

/// Gateway error taxonomy
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Missing or malformed request field
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Human-readable description
        message: String,
        /// Offending parameter, if known
        param: Option<String>,
    },

    /// No marketplace service advertises the requested model
    #[error("Model not found: {model}")]
    ModelNotFound {
        /// Requested model id
        model: String,
    },

    /// Network, provider, or broker failure
    #[error("{component} error: {message}")]
    Upstream {
        /// Which collaborator failed ("broker", "provider", ...)
        component: String,
        /// Error text as reported by the collaborator
        message: String,
    },

    /// A bounded operation did not finish in time
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The bound that elapsed
        duration: Duration,
    },

    /// The retry budget was spent without a usable response
    #[error("Exhausted {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        /// Number of attempts made
        attempts: u32,
        /// Last failure observed, kept for logs only
        last_error: String,
    },

    /// The caller went away before the request finished
    #[error("Request was cancelled")]
    Cancelled,

    /// Invalid gateway configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable description
        message: String,
    },

    /// Broken internal invariant
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable description
        message: String,
    },
}

impl GatewayError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>, param: Option<&str>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            param: param.map(String::from),
        }
    }

    /// Create a model not found error
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model: model.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create an exhausted retries error
    pub fn exhausted(attempts: u32, last_error: impl Into<String>) -> Self {
        Self::ExhaustedRetries {
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::ModelNotFound { .. } => 404,
            Self::Upstream { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Cancelled => 499,
            Self::ExhaustedRetries { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                500
            }
        }
    }

    /// OpenAI error `type` field
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } | Self::ModelNotFound { .. } => INVALID_REQUEST_ERROR,
            _ => SERVER_ERROR,
        }
    }

    /// OpenAI error `param` field
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { param, .. } => param.as_deref(),
            Self::ModelNotFound { .. } => Some("model"),
            _ => None,
        }
    }

    /// OpenAI error `code` field
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::ModelNotFound { .. } => "model_not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::Timeout { .. } => "timeout",
            Self::ExhaustedRetries { .. } => "exhausted_retries",
            Self::Cancelled => "cancelled",
            Self::Configuration { .. } => "configuration_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Message that is safe to show to API callers.
    ///
    /// Upstream payloads and the last retry error stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest { message, .. } => message.clone(),
            Self::ModelNotFound { model } => format!("Model '{model}' not found"),
            Self::Upstream { component, .. } => format!("The {component} request failed"),
            Self::Timeout { duration } => format!("Request timed out after {duration:?}"),
            Self::ExhaustedRetries { attempts, .. } => {
                format!("Failed to get a completion after {attempts} attempts")
            }
            Self::Cancelled => "Request was cancelled".to_string(),
            Self::Configuration { .. } | Self::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
