//! Response types for the gateway.
//!
//! Two families live here: the lenient `ProviderResponse` read from a
//! marketplace provider, and the strict OpenAI-compatible shapes the gateway
//! returns to its callers.

use crate::request::MessageRole;
use serde::{Deserialize, Serialize};

/// Raw chat completion body returned by a provider.
///
/// Every field is optional: providers that fail often answer with a 2xx and
/// an `error` object, or with `choices` but no content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Provider-assigned completion id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Completion choices
    #[serde(default)]
    pub choices: Vec<ProviderChoice>,

    /// Error reported in-band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// One provider choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderChoice {
    /// Generated message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ProviderMessage>,
}

/// Provider message body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// Generated text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ProviderResponse {
    /// Build a successful response with one choice
    #[must_use]
    pub fn with_content(id: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            id: id.map(String::from),
            choices: vec![ProviderChoice {
                message: Some(ProviderMessage {
                    content: Some(content.into()),
                }),
            }],
            error: None,
        }
    }

    /// Content of the first choice, if present and non-empty
    #[must_use]
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// In-band error text, whether sent as a string or as `{message}`
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => Some(
                map.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(
                        || serde_json::Value::Object(map.clone()).to_string(),
                        String::from,
                    ),
            ),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Normalized output of one successful orchestration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Completion id (provider-assigned or synthetic)
    pub id: String,
    /// Canonical model name
    pub model: String,
    /// Assistant content, never empty
    pub content: String,
    /// Terminal finish reason
    pub finish_reason: FinishReason,
}

impl CompletionResult {
    /// Render the OpenAI chat completion body
    #[must_use]
    pub fn into_response(self, created: i64) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: self.id,
            object: "chat.completion".to_string(),
            created,
            model: self.model,
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: MessageRole::Assistant,
                    content: self.content,
                },
                finish_reason: self.finish_reason,
            }],
            usage: Usage::default(),
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completion id
    pub id: String,
    /// Always "chat.completion"
    pub object: String,
    /// Unix timestamp in seconds
    pub created: i64,
    /// Model name
    pub model: String,
    /// Single choice
    pub choices: Vec<Choice>,
    /// Token usage (zeroed; no tokenizer runs in the gateway)
    pub usage: Usage,
}

/// Completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,
    /// Generated message
    pub message: ResponseMessage,
    /// Why generation stopped
    pub finish_reason: FinishReason,
}

/// Assistant message in a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Always assistant
    pub role: MessageRole,
    /// Generated text
    pub content: String,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop
    Stop,
}

/// Token usage accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Model entry for `/v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    /// Model id
    pub id: String,
    /// Always "model"
    pub object: String,
    /// Unix timestamp in seconds
    pub created: i64,
    /// Provider address serving the model
    pub owned_by: String,
}

impl ModelObject {
    /// Create a model entry
    #[must_use]
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created,
            owned_by: owned_by.into(),
        }
    }
}

/// Response for `/v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always "list"
    pub object: String,
    /// Models
    pub data: Vec<ModelObject>,
}

impl ModelsResponse {
    /// Wrap model entries
    #[must_use]
    pub fn new(data: Vec<ModelObject>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_content() {
        let response = ProviderResponse::with_content(Some("abc"), "Hello");
        assert_eq!(response.first_content(), Some("Hello"));
    }

    #[test]
    fn test_empty_content_is_not_content() {
        let response: ProviderResponse = serde_json::from_value(json!({
            "id": "x",
            "choices": [{"message": {"role": "assistant", "content": ""}}]
        }))
        .expect("deserialize");
        assert_eq!(response.first_content(), None);

        let response: ProviderResponse =
            serde_json::from_value(json!({"choices": [{"message": {}}]})).expect("deserialize");
        assert_eq!(response.first_content(), None);

        let response: ProviderResponse = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(response.first_content(), None);
    }

    #[test]
    fn test_error_message_shapes() {
        let response: ProviderResponse =
            serde_json::from_value(json!({"error": {"message": "settleFee: expected 2.0 A0GI"}}))
                .expect("deserialize");
        assert_eq!(
            response.error_message().as_deref(),
            Some("settleFee: expected 2.0 A0GI")
        );

        let response: ProviderResponse =
            serde_json::from_value(json!({"error": "bad gateway"})).expect("deserialize");
        assert_eq!(response.error_message().as_deref(), Some("bad gateway"));

        let response: ProviderResponse =
            serde_json::from_value(json!({"error": null})).expect("deserialize");
        assert_eq!(response.error_message(), None);
    }

    #[test]
    fn test_completion_wire_shape() {
        let result = CompletionResult {
            id: "chatcmpl-1".to_string(),
            model: "llama-3".to_string(),
            content: "Hi".to_string(),
            finish_reason: FinishReason::Stop,
        };

        let value = serde_json::to_value(result.into_response(1_700_000_000)).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "llama-3",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 0, "completion_tokens": 0, "total_tokens": 0}
            })
        );
    }

    #[test]
    fn test_models_response() {
        let response = ModelsResponse::new(vec![ModelObject::new("llama-3", "0xabc", 0)]);
        let value = serde_json::to_value(response).expect("serialize");
        assert_eq!(value["object"], "list");
        assert_eq!(value["data"][0]["object"], "model");
        assert_eq!(value["data"][0]["owned_by"], "0xabc");
    }
}
