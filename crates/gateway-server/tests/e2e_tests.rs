//! End-to-end tests for the ZG Inference Gateway.
//!
//! The router runs in-process with the real HTTP broker and inference
//! clients; the broker sidecar and the provider endpoint are wiremock
//! servers.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use gateway_completion::CompletionOrchestrator;
use gateway_config::GatewayConfig;
use gateway_providers::{HttpBroker, HttpBrokerConfig, HttpInferenceClient, HttpInferenceConfig};
use gateway_resilience::RetryPolicyBuilder;
use gateway_routing::{BrokerDirectory, ModelResolver};
use gateway_server::routes::create_router;
use gateway_server::AppState;
use gateway_telemetry::{Metrics, MetricsConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS: &str = "/v1/proxy/chat/completions";

/// Broker sidecar and provider endpoint
struct Marketplace {
    broker: MockServer,
    provider: MockServer,
}

impl Marketplace {
    async fn start() -> Self {
        let broker = MockServer::start().await;
        let provider = MockServer::start().await;
        let proxy_url = format!("{}/v1/proxy", provider.uri());

        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"provider": "0xa", "model": "llama-3", "url": proxy_url},
                {"provider": "0xb", "model": "phala/deepseek-r1-70b", "url": proxy_url}
            ])))
            .mount(&broker)
            .await;

        Self { broker, provider }
    }

    async fn sign_requests(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/headers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Address": "0xuser",
                "Signature": "0xsig"
            })))
            .expect(times)
            .mount(&self.broker)
            .await;
    }

    fn state(&self, metrics: Metrics) -> AppState {
        let broker = Arc::new(
            HttpBroker::new(HttpBrokerConfig::new(self.broker.uri())).expect("broker client"),
        );
        let transport = Arc::new(
            HttpInferenceClient::new(HttpInferenceConfig::default()).expect("inference client"),
        );
        let resolver = Arc::new(
            ModelResolver::new(Arc::new(BrokerDirectory::new(broker.clone())))
                .with_metrics(metrics.clone()),
        );
        let policy = RetryPolicyBuilder::new()
            .max_attempts(3)
            .delay(Duration::from_millis(10))
            .attempt_timeout(Duration::from_secs(10))
            .build();
        let orchestrator = CompletionOrchestrator::new(broker, transport, resolver)
            .with_retry_policy(policy)
            .with_metrics(metrics.clone());

        AppState::builder()
            .config(GatewayConfig::default())
            .orchestrator(Arc::new(orchestrator))
            .metrics(metrics)
            .build()
            .expect("state")
    }

    fn app(&self) -> Router {
        let metrics = Metrics::new(&MetricsConfig::default()).expect("metrics");
        create_router(self.state(metrics))
    }
}

fn chat(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn hello(model: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": "Be brief."},
            {"role": "user", "content": "Hello"}
        ]
    })
}

fn provider_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-upstream",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[cfg(test)]
mod health_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let market = Marketplace::start().await;
        let response = market.app().oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_after_directory_load() {
        let market = Marketplace::start().await;
        let app = market.app();

        let response = app.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app.clone().oneshot(get("/v1/models")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["services"], 2);
    }
}

#[cfg(test)]
mod models_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_models_endpoint_returns_list() {
        let market = Marketplace::start().await;
        let response = market.app().oneshot(get("/v1/models")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["object"], "list");

        let models = json["data"].as_array().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0]["id"], "llama-3");
        assert_eq!(models[0]["object"], "model");
        assert_eq!(models[0]["owned_by"], "0xa");
        assert!(models[0]["created"].is_i64());
    }

    #[tokio::test]
    async fn test_get_model_with_slash_in_name() {
        let market = Marketplace::start().await;
        let app = market.app();

        let response = app.clone().oneshot(get("/v1/models/llama-3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["owned_by"], "0xa");

        let response = app
            .clone()
            .oneshot(get("/v1/models/phala/deepseek-r1-70b"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["id"], "phala/deepseek-r1-70b");
        assert_eq!(json["owned_by"], "0xb");

        let response = app.oneshot(get("/v1/models/unknown-model")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "model_not_found");
    }
}

#[cfg(test)]
mod chat_completions_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_completion_wire_shape() {
        let market = Marketplace::start().await;
        market.sign_requests(1).await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .and(body_json(json!({
                "model": "llama-3",
                "messages": [{"role": "user", "content": "system: Be brief.\nuser: Hello"}]
            })))
            .respond_with(provider_reply("Hi there!"))
            .expect(1)
            .mount(&market.provider)
            .await;

        let response = market.app().oneshot(chat(&hello("llama-3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["id"], "chatcmpl-upstream");
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["model"], "llama-3");
        assert!(json["created"].is_i64());
        assert_eq!(json["choices"][0]["index"], 0);
        assert_eq!(json["choices"][0]["message"]["role"], "assistant");
        assert_eq!(json["choices"][0]["message"]["content"], "Hi there!");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert_eq!(
            json["usage"],
            json!({"prompt_tokens": 0, "completion_tokens": 0, "total_tokens": 0})
        );
    }

    #[tokio::test]
    async fn test_fee_shortfall_is_settled_and_retried() {
        let market = Marketplace::start().await;
        market.sign_requests(2).await;
        Mock::given(method("POST"))
            .and(path("/settle"))
            .and(body_json(json!({"provider": "0xa", "amount": "2.0"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&market.broker)
            .await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "settleFee: expected 2.0 A0GI"}
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&market.provider)
            .await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .respond_with(provider_reply("Paid and answered"))
            .mount(&market.provider)
            .await;

        let response = market.app().oneshot(chat(&hello("llama-3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["choices"][0]["message"]["content"], "Paid and answered");
    }

    #[tokio::test]
    async fn test_exhausted_retries_hide_provider_payload() {
        let market = Marketplace::start().await;
        market.sign_requests(3).await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": "gpu node 7 melted"})),
            )
            .expect(3)
            .mount(&market.provider)
            .await;

        let response = market.app().oneshot(chat(&hello("llama-3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "server_error");
        assert_eq!(json["error"]["code"], "exhausted_retries");
        assert!(!json["error"]["message"].as_str().unwrap().contains("melted"));
    }

    #[tokio::test]
    async fn test_unknown_model_never_signs() {
        let market = Marketplace::start().await;
        market.sign_requests(0).await;

        let response = market
            .app()
            .oneshot(chat(&hello("unknown-model")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert_eq!(json["error"]["param"], "model");
        assert_eq!(json["error"]["code"], "model_not_found");
    }

    #[tokio::test]
    async fn test_metrics_after_completion() {
        let market = Marketplace::start().await;
        market.sign_requests(1).await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .respond_with(provider_reply("ok"))
            .mount(&market.provider)
            .await;

        let app = market.app();
        let response = app.clone().oneshot(chat(&hello("llama-3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/metrics")).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("zg_gateway_completions_total"));
        assert!(text.contains("zg_gateway_directory_refreshes_total 1"));
    }
}

#[cfg(test)]
mod chat_completions_validation_tests {
    use super::*;

    async fn rejected(body: Value) -> Value {
        let market = Marketplace::start().await;
        market.sign_requests(0).await;

        let response = market.app().oneshot(chat(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request_error");
        json
    }

    #[tokio::test]
    async fn test_chat_completions_requires_model() {
        let json = rejected(json!({"messages": [{"role": "user", "content": "Hello"}]})).await;
        assert_eq!(json["error"]["param"], "model");
    }

    #[tokio::test]
    async fn test_chat_completions_requires_messages() {
        let json = rejected(json!({"model": "llama-3", "messages": []})).await;
        assert_eq!(json["error"]["param"], "messages");
    }

    #[tokio::test]
    async fn test_chat_completions_rejects_streaming() {
        let mut body = hello("llama-3");
        body["stream"] = json!(true);
        let json = rejected(body).await;
        assert_eq!(json["error"]["param"], "stream");
    }

    #[tokio::test]
    async fn test_chat_completions_validates_temperature() {
        let mut body = hello("llama-3");
        body["temperature"] = json!(3.0);
        let json = rejected(body).await;
        assert_eq!(json["error"]["param"], "temperature");
    }
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let market = Marketplace::start().await;
        let response = market
            .app()
            .oneshot(get("/nonexistent/endpoint"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_json_returns_error() {
        let market = Marketplace::start().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/chat/completions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{invalid json}"))
            .unwrap();

        let response = market.app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert!(json["error"]["param"].is_null());
    }

    #[tokio::test]
    async fn test_broker_down_is_bad_gateway() {
        let market = Marketplace::start().await;
        market.broker.reset().await;

        let response = market.app().oneshot(chat(&hello("llama-3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "upstream_error");
    }
}
