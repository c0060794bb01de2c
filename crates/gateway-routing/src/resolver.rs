//! Model resolution.
//!
//! Resolution is two-phase: look in the cache, and on a miss refresh the
//! whole directory once and look again. There is no fuzzy matching.

use crate::cache::{CacheSnapshot, ServiceCache};
use crate::directory::ServiceDirectory;
use gateway_core::{GatewayError, GatewayResult, ServiceRecord};
use gateway_telemetry::Metrics;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Provider and endpoint chosen for a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    /// Provider address
    pub provider: String,
    /// Service endpoint URL
    pub endpoint: String,
    /// Canonical model name, echoed in responses
    pub model: String,
}

impl From<ServiceRecord> for ResolvedService {
    fn from(record: ServiceRecord) -> Self {
        Self {
            provider: record.provider,
            endpoint: record.endpoint,
            model: record.model,
        }
    }
}

/// Resolves model ids against a cached service directory
pub struct ModelResolver {
    directory: Arc<dyn ServiceDirectory>,
    cache: ServiceCache,
    refresh_lock: Mutex<()>,
    metrics: Option<Metrics>,
}

impl ModelResolver {
    /// Create a resolver with an empty cache
    #[must_use]
    pub fn new(directory: Arc<dyn ServiceDirectory>) -> Self {
        Self {
            directory,
            cache: ServiceCache::new(),
            refresh_lock: Mutex::new(()),
            metrics: None,
        }
    }

    /// Count refreshes in `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve `model_id` to a provider and endpoint
    ///
    /// # Errors
    /// Returns `ModelNotFound` if the model is absent after one refresh, or
    /// the directory's `Upstream` error if the refresh itself fails
    #[instrument(skip(self))]
    pub async fn resolve(&self, model_id: &str) -> GatewayResult<ResolvedService> {
        if let Some(record) = self.cache.lookup(model_id) {
            return Ok(record.into());
        }

        let _guard = self.refresh_lock.lock().await;
        // Another resolution may have refreshed while this one waited
        if let Some(record) = self.cache.lookup(model_id) {
            return Ok(record.into());
        }

        debug!(model = %model_id, "Cache miss, refreshing service directory");
        self.refresh_locked().await?;

        self.cache
            .lookup(model_id)
            .map(ResolvedService::from)
            .ok_or_else(|| GatewayError::model_not_found(model_id))
    }

    /// Replace the cache with a fresh directory listing.
    ///
    /// Refreshes are serialized; the new snapshot is fully built before it
    /// is swapped in.
    ///
    /// # Errors
    /// Returns the directory error; the previous snapshot stays in place
    pub async fn refresh(&self) -> GatewayResult<usize> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Caller holds `refresh_lock`
    async fn refresh_locked(&self) -> GatewayResult<usize> {
        let records = self.directory.list_services().await?;
        let count = records.len();
        self.cache.replace(records);

        if let Some(metrics) = &self.metrics {
            metrics.record_directory_refresh();
        }
        info!(services = count, "Service directory refreshed");
        Ok(count)
    }

    /// All known services, refreshing first if the cache is empty
    ///
    /// # Errors
    /// Returns the directory error if a refresh was needed and failed
    pub async fn list_models(&self) -> GatewayResult<Arc<CacheSnapshot>> {
        if self.cache.is_empty() {
            let _guard = self.refresh_lock.lock().await;
            if self.cache.is_empty() {
                self.refresh_locked().await?;
            }
        }
        Ok(self.cache.snapshot())
    }

    /// Whether at least one service is cached
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.cache.is_empty()
    }

    /// Number of cached services
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.cache.snapshot().len()
    }
}
