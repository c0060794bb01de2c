//! Prometheus metrics for the gateway.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metrics configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Metric name prefix
    pub namespace: String,
    /// Histogram buckets for attempt latency, in seconds
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "zg_gateway".to_string(),
            latency_buckets: vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0],
        }
    }
}

/// Outcome of a single inference attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Usable content returned
    Success,
    /// Provider asked for a fee to be settled
    FeeShortfall,
    /// Retryable failure
    Transient,
    /// Non-retryable provider failure
    Fatal,
    /// Attempt hit its timeout
    Timeout,
}

impl AttemptOutcome {
    /// Label value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::FeeShortfall => "fee_shortfall",
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Timeout => "timeout",
        }
    }
}

/// Gateway metrics backed by a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    completions: IntCounterVec,
    attempts: IntCounterVec,
    settlements: IntCounterVec,
    directory_refreshes: IntCounter,
    attempt_duration: HistogramVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register all collectors
    ///
    /// # Errors
    /// Returns error if a collector cannot be created or registered
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let ns = config.namespace.as_str();

        let completions = IntCounterVec::new(
            Opts::new("completions_total", "Chat completion requests by outcome").namespace(ns),
            &["model", "outcome"],
        )?;
        let attempts = IntCounterVec::new(
            Opts::new("attempts_total", "Inference attempts by outcome").namespace(ns),
            &["provider", "outcome"],
        )?;
        let settlements = IntCounterVec::new(
            Opts::new("fee_settlements_total", "Fee settlements by outcome").namespace(ns),
            &["provider", "outcome"],
        )?;
        let directory_refreshes = IntCounter::with_opts(
            Opts::new("directory_refreshes_total", "Service directory refreshes").namespace(ns),
        )?;
        let attempt_duration = HistogramVec::new(
            HistogramOpts::new("attempt_duration_seconds", "Inference attempt latency")
                .namespace(ns)
                .buckets(config.latency_buckets.clone()),
            &["provider"],
        )?;

        registry.register(Box::new(completions.clone()))?;
        registry.register(Box::new(attempts.clone()))?;
        registry.register(Box::new(settlements.clone()))?;
        registry.register(Box::new(directory_refreshes.clone()))?;
        registry.register(Box::new(attempt_duration.clone()))?;

        Ok(Self {
            registry,
            completions,
            attempts,
            settlements,
            directory_refreshes,
            attempt_duration,
        })
    }

    /// Record a finished completion request
    pub fn record_completion(&self, model: &str, outcome: &str) {
        self.completions.with_label_values(&[model, outcome]).inc();
    }

    /// Record one inference attempt
    pub fn record_attempt(&self, provider: &str, outcome: AttemptOutcome, duration: Duration) {
        self.attempts
            .with_label_values(&[provider, outcome.as_str()])
            .inc();
        self.attempt_duration
            .with_label_values(&[provider])
            .observe(duration.as_secs_f64());
    }

    /// Record a fee settlement
    pub fn record_settlement(&self, provider: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.settlements
            .with_label_values(&[provider, outcome])
            .inc();
    }

    /// Record a service directory refresh
    pub fn record_directory_refresh(&self) {
        self.directory_refreshes.inc();
    }

    /// Render all metrics in Prometheus text format
    #[must_use]
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Metrics error
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus rejected a collector
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
