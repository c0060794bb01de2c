//! Broker sidecar client.
//!
//! The sidecar holds the wallet and talks to the chain. Its REST surface:
//! - `GET  /services` lists advertised services
//! - `POST /headers` issues single-use request headers for `{provider, content}`
//! - `POST /settle` settles `{provider, amount}`
//! - `GET  /services/{provider}` returns one provider's endpoint and model

use crate::http_error::{send_error, status_error};
use async_trait::async_trait;
use gateway_core::{
    Broker, FeeAmount, GatewayError, GatewayResult, RequestHeaders, ServiceMetadata,
    ServiceRecord,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

const COMPONENT: &str = "broker";

/// Broker client configuration
#[derive(Debug, Clone)]
pub struct HttpBrokerConfig {
    /// Sidecar base URL
    pub base_url: String,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Per-call timeout
    pub timeout: Duration,
}

impl HttpBrokerConfig {
    /// Create a configuration for `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_api_token(mut self, token: SecretString) -> Self {
        self.api_token = Some(token);
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `Broker` implementation over the sidecar REST API
pub struct HttpBroker {
    config: HttpBrokerConfig,
    client: Client,
}

#[derive(Serialize)]
struct HeadersRequest<'a> {
    provider: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct SettleRequest<'a> {
    provider: &'a str,
    amount: &'a str,
}

impl HttpBroker {
    /// Create a broker client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: HttpBrokerConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> GatewayResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| send_error(COMPONENT, &e, self.config.timeout))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(status_error(COMPONENT, status, &body))
    }

    async fn json<T: serde::de::DeserializeOwned>(&self, response: Response) -> GatewayResult<T> {
        response.json().await.map_err(|e| {
            GatewayError::upstream(COMPONENT, format!("Failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl Broker for HttpBroker {
    #[instrument(skip(self))]
    async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>> {
        let response = self.send(self.request(Method::GET, "/services")).await?;
        self.json(response).await
    }

    #[instrument(skip(self, content), fields(content_len = content.len()))]
    async fn get_request_headers(
        &self,
        provider: &str,
        content: &str,
    ) -> GatewayResult<RequestHeaders> {
        let response = self
            .send(
                self.request(Method::POST, "/headers")
                    .json(&HeadersRequest { provider, content }),
            )
            .await?;

        // Values may come back as numbers (nonce, fee); headers are text.
        let raw: BTreeMap<String, serde_json::Value> = self.json(response).await?;
        let headers = raw
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect::<RequestHeaders>();

        debug!(provider = %provider, count = headers.len(), "Obtained request headers");
        Ok(headers)
    }

    #[instrument(skip(self), fields(amount = %amount))]
    async fn settle_fee(&self, provider: &str, amount: &FeeAmount) -> GatewayResult<()> {
        self.send(self.request(Method::POST, "/settle").json(&SettleRequest {
            provider,
            amount: amount.as_str(),
        }))
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_service_metadata(&self, provider: &str) -> GatewayResult<ServiceMetadata> {
        let response = self
            .send(self.request(Method::GET, &format!("/services/{provider}")))
            .await?;
        self.json(response).await
    }
}
