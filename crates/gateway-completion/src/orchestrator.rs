//! Completion orchestration.
//!
//! One request runs as a single sequential loop:
//!
//! ```text
//! validate -> resolve -> [ sign -> call -> evaluate -> (settle) -> wait ]* -> normalize
//! ```
//!
//! Resolution failures end the request without spending the attempt budget.
//! Each attempt signs afresh, because headers are tied to a nonce upstream.
//! A fee shortfall is settled before the next attempt, but never once the
//! budget is spent and never after the caller has gone away.

use crate::normalizer::normalize;
use gateway_core::{
    Broker, ChatCompletionRequest, CompletionResult, FeeAmount, GatewayError, GatewayResult,
    InferenceBody, InferenceTransport, ProviderResponse, RequestHeaders,
};
use gateway_resilience::{Classification, ErrorClassifier, PatternClassifier, RetryPolicy};
use gateway_routing::{ModelResolver, ResolvedService};
use gateway_telemetry::{AttemptOutcome, Metrics};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Metric label for requests that never resolved to a model
const UNRESOLVED_MODEL: &str = "unknown";

/// Record of one attempt; never outlives the orchestration that made it
#[derive(Debug)]
pub struct InferenceAttempt {
    /// 1-indexed attempt number
    pub number: u32,
    /// Headers issued for this attempt (empty if signing failed)
    pub headers: RequestHeaders,
    /// When signing started
    pub started: Instant,
    /// When the call returned or timed out
    pub finished: Instant,
    /// Raw provider response or the failure
    pub result: GatewayResult<ProviderResponse>,
}

impl InferenceAttempt {
    /// Wall-clock duration of the attempt
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished.saturating_duration_since(self.started)
    }

    /// The response, if it carries non-empty content
    #[must_use]
    pub fn success(&self) -> Option<&ProviderResponse> {
        self.result
            .as_ref()
            .ok()
            .filter(|response| response.first_content().is_some())
    }

    /// Text describing why the attempt did not succeed
    #[must_use]
    pub fn error_text(&self) -> String {
        match &self.result {
            Ok(response) => response
                .error_message()
                .unwrap_or_else(|| "provider returned no content".to_string()),
            Err(e) => e.to_string(),
        }
    }

    fn timed_out(&self) -> bool {
        matches!(self.result, Err(GatewayError::Timeout { .. }))
    }
}

/// One `(model, provider)` pair from the service directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelListing {
    /// Model id
    pub id: String,
    /// Provider address
    pub provider: String,
}

/// Drives a chat completion through the marketplace
pub struct CompletionOrchestrator {
    broker: Arc<dyn Broker>,
    transport: Arc<dyn InferenceTransport>,
    resolver: Arc<ModelResolver>,
    policy: RetryPolicy,
    classifier: Arc<dyn ErrorClassifier>,
    metrics: Option<Metrics>,
}

impl CompletionOrchestrator {
    /// Create an orchestrator with the default retry policy and classifier
    #[must_use]
    pub fn new(
        broker: Arc<dyn Broker>,
        transport: Arc<dyn InferenceTransport>,
        resolver: Arc<ModelResolver>,
    ) -> Self {
        Self {
            broker,
            transport,
            resolver,
            policy: RetryPolicy::with_defaults(),
            classifier: Arc::new(PatternClassifier::new()),
            metrics: None,
        }
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the error classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Record attempts and outcomes in `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The resolver backing this orchestrator
    #[must_use]
    pub fn resolver(&self) -> &Arc<ModelResolver> {
        &self.resolver
    }

    /// Run a completion that cannot be cancelled
    ///
    /// # Errors
    /// See [`Self::complete_with_cancellation`]
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> GatewayResult<CompletionResult> {
        self.complete_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Run a completion, giving up as soon as `token` is cancelled
    ///
    /// # Errors
    /// - `InvalidRequest` before any network call
    /// - `ModelNotFound` or the directory's `Upstream` error from resolution
    /// - `Upstream` if the classifier marks a provider error fatal
    /// - `ExhaustedRetries` once every attempt has failed
    /// - `Cancelled` if the token fires first
    #[instrument(skip_all, fields(model = %request.model))]
    pub async fn complete_with_cancellation(
        &self,
        request: &ChatCompletionRequest,
        token: &CancellationToken,
    ) -> GatewayResult<CompletionResult> {
        // Only resolved model names become metric labels
        let (model, result) = match self.resolve(request, token).await {
            Ok(service) => {
                let result = self.run(request, &service, token).await;
                (service.model, result)
            }
            Err(e) => (UNRESOLVED_MODEL.to_string(), Err(e)),
        };

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.code(),
            };
            metrics.record_completion(&model, outcome);
        }

        result
    }

    async fn resolve(
        &self,
        request: &ChatCompletionRequest,
        token: &CancellationToken,
    ) -> GatewayResult<ResolvedService> {
        request.validate()?;

        let service = cancellable(token, self.resolver.resolve(&request.model)).await?;
        debug!(provider = %service.provider, endpoint = %service.endpoint, "Resolved model");
        Ok(service)
    }

    async fn run(
        &self,
        request: &ChatCompletionRequest,
        service: &ResolvedService,
        token: &CancellationToken,
    ) -> GatewayResult<CompletionResult> {
        let mut body = InferenceBody::new(&service.model, request.canonical_content());
        body.temperature = request.temperature;
        body.max_tokens = request.max_tokens;

        let max_attempts = self.policy.max_attempts();
        let mut last_error = String::new();

        for number in 1..=max_attempts {
            let attempt = cancellable(token, async {
                Ok(self.attempt(number, service, &body).await)
            })
            .await?;

            if let Some(response) = attempt.success() {
                self.record_attempt(service, AttemptOutcome::Success, &attempt);
                info!(
                    attempt = number,
                    provider = %service.provider,
                    duration_ms = attempt.duration().as_millis() as u64,
                    "Completion succeeded"
                );
                return normalize(response, &service.model);
            }

            let error_text = attempt.error_text();
            match self.classifier.classify(&error_text) {
                Classification::Fatal => {
                    self.record_attempt(service, AttemptOutcome::Fatal, &attempt);
                    error!(
                        attempt = number,
                        provider = %service.provider,
                        error = %error_text,
                        "Provider error is not retryable"
                    );
                    return Err(GatewayError::upstream("provider", error_text));
                }
                Classification::FeeShortfall(amount) => {
                    self.record_attempt(service, AttemptOutcome::FeeShortfall, &attempt);
                    if self.policy.has_next(number) {
                        self.settle(service, &amount, token).await?;
                    } else {
                        debug!(amount = %amount, "Attempt budget spent, not settling");
                    }
                }
                Classification::Transient => {
                    let outcome = if attempt.timed_out() {
                        AttemptOutcome::Timeout
                    } else {
                        AttemptOutcome::Transient
                    };
                    self.record_attempt(service, outcome, &attempt);
                    warn!(
                        attempt = number,
                        max_attempts = max_attempts,
                        provider = %service.provider,
                        duration_ms = attempt.duration().as_millis() as u64,
                        error = %error_text,
                        "Attempt failed"
                    );
                }
            }
            last_error = error_text;

            if self.policy.has_next(number) {
                cancellable(token, async {
                    self.policy.wait(number).await;
                    Ok(())
                })
                .await?;
            }
        }

        error!(
            attempts = max_attempts,
            provider = %service.provider,
            last_error = %last_error,
            "Completion failed after all attempts"
        );
        Err(GatewayError::exhausted(max_attempts, last_error))
    }

    /// Sign and call once, bounded by the attempt timeout
    async fn attempt(
        &self,
        number: u32,
        service: &ResolvedService,
        body: &InferenceBody,
    ) -> InferenceAttempt {
        let started = Instant::now();
        let timeout = self.policy.attempt_timeout();
        let mut headers = RequestHeaders::new();

        let call = async {
            headers = self
                .broker
                .get_request_headers(&service.provider, body.content())
                .await?;
            self.transport.send(&service.endpoint, &headers, body).await
        };
        let result = tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(GatewayError::timeout(timeout)));

        InferenceAttempt {
            number,
            headers,
            started,
            finished: Instant::now(),
            result,
        }
    }

    /// Settle a shortfall; a failed settlement only costs this attempt
    async fn settle(
        &self,
        service: &ResolvedService,
        amount: &FeeAmount,
        token: &CancellationToken,
    ) -> GatewayResult<()> {
        if token.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        warn!(provider = %service.provider, amount = %amount, "Settling fee shortfall");
        let settled = cancellable(token, async {
            Ok(self.broker.settle_fee(&service.provider, amount).await)
        })
        .await?;

        let success = settled.is_ok();
        if let Some(metrics) = &self.metrics {
            metrics.record_settlement(&service.provider, success);
        }
        if let Err(e) = settled {
            warn!(
                provider = %service.provider,
                amount = %amount,
                error = %e,
                "Fee settlement failed"
            );
        }
        Ok(())
    }

    fn record_attempt(
        &self,
        service: &ResolvedService,
        outcome: AttemptOutcome,
        attempt: &InferenceAttempt,
    ) {
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt(&service.provider, outcome, attempt.duration());
        }
    }

    /// Every `(model, provider)` pair in the service cache
    ///
    /// # Errors
    /// Returns the directory error if the cache was empty and refreshing failed
    pub async fn list_models(&self) -> GatewayResult<Vec<ModelListing>> {
        let snapshot = self.resolver.list_models().await?;
        Ok(snapshot
            .records()
            .iter()
            .map(|record| ModelListing {
                id: record.model.clone(),
                provider: record.provider.clone(),
            })
            .collect())
    }

    /// Look up one model
    ///
    /// # Errors
    /// Returns `ModelNotFound` if no service advertises `model_id`
    pub async fn get_model(&self, model_id: &str) -> GatewayResult<ModelListing> {
        let service = self.resolver.resolve(model_id).await?;
        Ok(ModelListing {
            id: service.model,
            provider: service.provider,
        })
    }
}

/// Race `fut` against the caller's cancellation
async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = GatewayResult<T>>,
) -> GatewayResult<T> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(GatewayError::Cancelled),
        result = fut => result,
    }
}
