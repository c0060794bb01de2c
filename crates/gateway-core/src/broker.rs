//! Marketplace capabilities consumed by the gateway.
//!
//! The broker owns wallet keys and on-chain settlement; the gateway only
//! calls it. The inference transport is the plain "POST JSON, read JSON"
//! call against a provider endpoint.

use crate::error::{GatewayError, GatewayResult};
use crate::response::ProviderResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-request authentication headers issued by the broker
pub type RequestHeaders = BTreeMap<String, String>;

/// One advertised inference service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Provider address
    pub provider: String,
    /// Model served
    pub model: String,
    /// Service endpoint URL
    #[serde(alias = "url")]
    pub endpoint: String,
}

impl ServiceRecord {
    /// Create a service record
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Metadata for a single pinned provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Service endpoint URL
    #[serde(alias = "url")]
    pub endpoint: String,
    /// Model served
    pub model: String,
}

/// Decimal fee amount, kept as the exact text the provider reported.
///
/// Settlement forwards this text verbatim so no precision is lost to a
/// float round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeeAmount(String);

impl FeeAmount {
    /// Parse a non-negative decimal such as `2`, `1.5` or `0.000125`
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the text is not a plain decimal
    pub fn parse(text: &str) -> GatewayResult<Self> {
        let text = text.trim();
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (text, None),
        };

        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || fraction.is_some_and(|f| !digits(f)) {
            return Err(GatewayError::invalid_request(
                format!("'{text}' is not a decimal fee amount"),
                None,
            ));
        }

        Ok(Self(text.to_string()))
    }

    /// The decimal text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FeeAmount {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FeeAmount> for String {
    fn from(value: FeeAmount) -> Self {
        value.0
    }
}

/// Body sent to a provider endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceBody {
    /// Canonical model name
    pub model: String,
    /// A single user message carrying the canonical content
    pub messages: Vec<InferenceMessage>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl InferenceBody {
    /// Wrap canonical content for a model
    #[must_use]
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![InferenceMessage {
                role: "user".to_string(),
                content: content.into(),
            }],
            temperature: None,
            max_tokens: None,
        }
    }

    /// The canonical content carried by this body
    #[must_use]
    pub fn content(&self) -> &str {
        self.messages.first().map_or("", |m| m.content.as_str())
    }
}

/// Message inside an inference body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceMessage {
    /// Message role
    pub role: String,
    /// Message content
    pub content: String,
}

/// Marketplace broker capability
#[async_trait]
pub trait Broker: Send + Sync {
    /// List every advertised inference service
    async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>>;

    /// Fetch single-use authentication headers for `(provider, content)`
    async fn get_request_headers(
        &self,
        provider: &str,
        content: &str,
    ) -> GatewayResult<RequestHeaders>;

    /// Settle an outstanding fee with a provider
    async fn settle_fee(&self, provider: &str, amount: &FeeAmount) -> GatewayResult<()>;

    /// Endpoint and model of one provider
    async fn get_service_metadata(&self, provider: &str) -> GatewayResult<ServiceMetadata>;
}

/// Outbound inference call
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// POST `body` to `endpoint` with the signed `headers`
    async fn send(
        &self,
        endpoint: &str,
        headers: &RequestHeaders,
        body: &InferenceBody,
    ) -> GatewayResult<ProviderResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_amount_parse() {
        assert_eq!(FeeAmount::parse("1.5").expect("valid").as_str(), "1.5");
        assert_eq!(FeeAmount::parse("2").expect("valid").as_str(), "2");
        assert_eq!(
            FeeAmount::parse("0.000000000000000125").expect("valid").as_str(),
            "0.000000000000000125"
        );
    }

    #[test]
    fn test_fee_amount_rejects_garbage() {
        for bad in ["", ".5", "1.", "-1", "1e3", "abc", "1.2.3"] {
            assert!(FeeAmount::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_fee_amount_serializes_as_string() {
        let amount = FeeAmount::parse("2.0").expect("valid");
        assert_eq!(serde_json::to_string(&amount).expect("serialize"), "\"2.0\"");
    }

    #[test]
    fn test_service_record_accepts_url_alias() {
        let record: ServiceRecord = serde_json::from_str(
            r#"{"provider":"0xabc","model":"llama-3","url":"http://p.example"}"#,
        )
        .expect("deserialize");
        assert_eq!(record.endpoint, "http://p.example");
    }

    #[test]
    fn test_inference_body_shape() {
        let body = InferenceBody::new("llama-3", "user: hi");
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "model": "llama-3",
                "messages": [{"role": "user", "content": "user: hi"}]
            })
        );
        assert_eq!(body.content(), "user: hi");
    }
}
