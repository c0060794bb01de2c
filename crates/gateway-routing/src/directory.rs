//! Service directories.
//!
//! A directory is a thin read of the broker. It does not retry and does not
//! touch the cache; the resolver owns both concerns.

use async_trait::async_trait;
use gateway_core::{Broker, GatewayError, GatewayResult, ServiceRecord};
use std::sync::Arc;
use tracing::debug;

/// Source of advertised inference services
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// Fetch the full current service list
    async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>>;
}

/// Directory listing every service the broker knows about
pub struct BrokerDirectory {
    broker: Arc<dyn Broker>,
}

impl BrokerDirectory {
    /// Create a directory over `broker`
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl ServiceDirectory for BrokerDirectory {
    async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>> {
        let services = self.broker.list_services().await.map_err(as_upstream)?;
        debug!(count = services.len(), "Listed marketplace services");
        Ok(services)
    }
}

/// Directory restricted to one pinned provider
pub struct PinnedDirectory {
    broker: Arc<dyn Broker>,
    provider: String,
}

impl PinnedDirectory {
    /// Create a directory serving only `provider`
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, provider: impl Into<String>) -> Self {
        Self {
            broker,
            provider: provider.into(),
        }
    }
}

#[async_trait]
impl ServiceDirectory for PinnedDirectory {
    async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>> {
        let metadata = self
            .broker
            .get_service_metadata(&self.provider)
            .await
            .map_err(as_upstream)?;
        debug!(provider = %self.provider, model = %metadata.model, "Fetched pinned service");
        Ok(vec![ServiceRecord::new(
            &self.provider,
            metadata.model,
            metadata.endpoint,
        )])
    }
}

fn as_upstream(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::Upstream { .. } | GatewayError::Timeout { .. } => err,
        other => GatewayError::upstream("directory", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{FeeAmount, RequestHeaders, ServiceMetadata};

    struct FixedBroker {
        fail: bool,
    }

    #[async_trait]
    impl Broker for FixedBroker {
        async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>> {
            if self.fail {
                return Err(GatewayError::internal("contract read reverted"));
            }
            Ok(vec![
                ServiceRecord::new("0xa", "llama-3", "http://a"),
                ServiceRecord::new("0xb", "deepseek-r1-70b", "http://b"),
            ])
        }

        async fn get_request_headers(&self, _: &str, _: &str) -> GatewayResult<RequestHeaders> {
            Ok(RequestHeaders::new())
        }

        async fn settle_fee(&self, _: &str, _: &FeeAmount) -> GatewayResult<()> {
            Ok(())
        }

        async fn get_service_metadata(&self, provider: &str) -> GatewayResult<ServiceMetadata> {
            if self.fail {
                return Err(GatewayError::upstream("broker", "unknown provider"));
            }
            Ok(ServiceMetadata {
                endpoint: format!("http://{provider}.example/v1/proxy"),
                model: "phala/deepseek-r1-70b".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_broker_directory_lists_all() {
        let directory = BrokerDirectory::new(Arc::new(FixedBroker { fail: false }));
        let services = directory.list_services().await.expect("list");
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].model, "deepseek-r1-70b");
    }

    #[tokio::test]
    async fn test_broker_failure_is_upstream() {
        let directory = BrokerDirectory::new(Arc::new(FixedBroker { fail: true }));
        let err = directory.list_services().await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_pinned_directory_uses_metadata() {
        let directory = PinnedDirectory::new(Arc::new(FixedBroker { fail: false }), "0xpin");
        let services = directory.list_services().await.expect("list");
        assert_eq!(
            services,
            vec![ServiceRecord::new(
                "0xpin",
                "phala/deepseek-r1-70b",
                "http://0xpin.example/v1/proxy"
            )]
        );
    }

    #[tokio::test]
    async fn test_pinned_directory_failure() {
        let directory = PinnedDirectory::new(Arc::new(FixedBroker { fail: true }), "0xpin");
        assert!(directory.list_services().await.is_err());
    }
}
