//! Mapping of HTTP failures into `GatewayError`.

use gateway_core::GatewayError;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

/// Map a transport-level reqwest error
pub(crate) fn send_error(component: &str, err: &reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::timeout(timeout);
    }
    GatewayError::upstream(component, format!("Request failed: {err}"))
}

/// Map a non-2xx response body
pub(crate) fn status_error(
    component: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> GatewayError {
    GatewayError::upstream(
        component,
        format!("HTTP {}: {}", status.as_u16(), error_text(body)),
    )
}

/// Best-effort error message from a response body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`; anything else is returned as (truncated) text.
pub(crate) fn error_text(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .or_else(|| value.get("message"))
            .and_then(serde_json::Value::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
