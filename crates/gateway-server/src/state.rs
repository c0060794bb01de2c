//! Shared application state.

use gateway_completion::CompletionOrchestrator;
use gateway_config::GatewayConfig;
use gateway_core::{GatewayError, GatewayResult};
use gateway_telemetry::{Metrics, MetricsConfig};
use std::sync::Arc;
use std::time::Instant;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration
    pub config: Arc<GatewayConfig>,
    /// Completion orchestrator
    pub orchestrator: Arc<CompletionOrchestrator>,
    /// Metrics registry
    pub metrics: Metrics,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Start building application state
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Seconds since the state was built
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<GatewayConfig>,
    orchestrator: Option<Arc<CompletionOrchestrator>>,
    metrics: Option<Metrics>,
}

impl AppStateBuilder {
    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the orchestrator
    #[must_use]
    pub fn orchestrator(mut self, orchestrator: Arc<CompletionOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Set the metrics registry
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state
    ///
    /// # Errors
    /// Returns `Configuration` if no orchestrator was set or the default
    /// metrics registry cannot be created
    pub fn build(self) -> GatewayResult<AppState> {
        let orchestrator = self
            .orchestrator
            .ok_or_else(|| GatewayError::configuration("an orchestrator is required"))?;

        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new(&MetricsConfig::default())
                .map_err(|e| GatewayError::configuration(e.to_string()))?,
        };

        Ok(AppState {
            config: Arc::new(self.config.unwrap_or_default()),
            orchestrator,
            metrics,
            started_at: Instant::now(),
        })
    }
}
