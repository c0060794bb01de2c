//! HTTP inference transport.
//!
//! Posts the signed chat body to `{endpoint}/chat/completions`. The response
//! is read leniently; deciding whether it is usable is left to the caller.

use crate::http_error::{send_error, status_error};
use async_trait::async_trait;
use gateway_core::{
    GatewayError, GatewayResult, InferenceBody, InferenceTransport, ProviderResponse,
    RequestHeaders,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

const COMPONENT: &str = "provider";

/// Transport configuration
#[derive(Debug, Clone)]
pub struct HttpInferenceConfig {
    /// Hard ceiling on a single HTTP call; attempt deadlines are applied above
    pub timeout: Duration,
}

impl Default for HttpInferenceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }
}

/// `InferenceTransport` over reqwest
pub struct HttpInferenceClient {
    config: HttpInferenceConfig,
    client: Client,
}

impl HttpInferenceClient {
    /// Create a transport
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: HttpInferenceConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn completions_url(endpoint: &str) -> String {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }

    fn header_map(headers: &RequestHeaders) -> GatewayResult<HeaderMap> {
        let mut map = HeaderMap::with_capacity(headers.len() + 1);
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                GatewayError::upstream("broker", format!("Invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                GatewayError::upstream("broker", format!("Invalid value for header '{name}': {e}"))
            })?;
            map.insert(name, value);
        }

        Ok(map)
    }
}

#[async_trait]
impl InferenceTransport for HttpInferenceClient {
    #[instrument(skip(self, headers, body), fields(model = %body.model))]
    async fn send(
        &self,
        endpoint: &str,
        headers: &RequestHeaders,
        body: &InferenceBody,
    ) -> GatewayResult<ProviderResponse> {
        let url = Self::completions_url(endpoint);
        let header_map = Self::header_map(headers)?;

        debug!(url = %url, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .headers(header_map)
            .json(body)
            .send()
            .await
            .map_err(|e| send_error(COMPONENT, &e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(COMPONENT, status, &text));
        }

        response.json::<ProviderResponse>().await.map_err(|e| {
            GatewayError::upstream(COMPONENT, format!("Failed to parse response: {e}"))
        })
    }
}
