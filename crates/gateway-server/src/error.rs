//! API error responses.
//!
//! Every failure leaves the gateway as the OpenAI envelope:
//!
//! ```json
//! {"error": {"message": "...", "type": "...", "param": null, "code": "..."}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{error::INVALID_REQUEST_ERROR, GatewayError};
use serde::Serialize;
use tracing::{debug, error};

/// Error returned by HTTP handlers
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Caller-facing message
    pub message: String,
    /// OpenAI error type
    pub error_type: &'static str,
    /// Offending parameter
    pub param: Option<String>,
    /// Machine-readable code
    pub code: &'static str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    error_type: &'a str,
    param: Option<&'a str>,
    code: &'a str,
}

impl ApiError {
    /// 400 for a request the gateway could not read
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            error_type: INVALID_REQUEST_ERROR,
            param: None,
            code: "invalid_request",
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %err, code = err.code(), "Request failed");
        } else {
            debug!(error = %err, code = err.code(), "Request rejected");
        }

        Self {
            status,
            message: err.public_message(),
            error_type: err.error_type(),
            param: err.param().map(String::from),
            code: err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                message: &self.message,
                error_type: self.error_type,
                param: self.param.as_deref(),
                code: self.code,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
