//! Request types for the gateway.
//!
//! This module defines the OpenAI-compatible chat completion request and the
//! canonical flattening of its messages into a single content string.

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Target model (e.g., "llama-3")
    #[serde(default)]
    pub model: String,

    /// Chat messages in conversation order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Streaming flag; only `false` is served
    #[serde(default)]
    pub stream: bool,

    /// User identifier for abuse tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    /// Create a request for a model and message sequence
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max_tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Validate the request before any network activity
    ///
    /// # Errors
    /// Returns `InvalidRequest` naming the first offending parameter
    pub fn validate(&self) -> GatewayResult<()> {
        if self.model.trim().is_empty() {
            return Err(GatewayError::invalid_request(
                "model is required",
                Some("model"),
            ));
        }

        if self.messages.is_empty() {
            return Err(GatewayError::invalid_request(
                "messages cannot be empty",
                Some("messages"),
            ));
        }

        if self.stream {
            return Err(GatewayError::invalid_request(
                "streaming responses are not supported",
                Some("stream"),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(GatewayError::invalid_request(
                    format!("temperature must be between 0.0 and 2.0, got {t}"),
                    Some("temperature"),
                ));
            }
        }

        Ok(())
    }

    /// Canonical content used both for signing and for the request body
    #[must_use]
    pub fn canonical_content(&self) -> String {
        flatten_messages(&self.messages)
    }
}

/// Flatten messages into `"<role>: <content>"` lines, in conversation order.
///
/// Signing and accounting upstream are content-addressed, so this exact
/// rendering must be used for both the header request and the call body.
#[must_use]
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Chat message with role and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}
