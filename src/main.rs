//! # ZG Inference Gateway
//!
//! OpenAI-compatible gateway in front of a decentralized inference
//! marketplace. Provider discovery, per-request signing, and fee settlement
//! are delegated to a broker sidecar.
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! zg-inference-gateway
//!
//! # Start with custom config file
//! zg-inference-gateway --config /path/to/config.yaml
//!
//! # Start with environment overrides
//! GATEWAY_PORT=9000 GATEWAY_BROKER_URL=http://broker:3080 zg-inference-gateway
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use gateway_completion::CompletionOrchestrator;
use gateway_config::{ConfigLoader, GatewayConfig};
use gateway_providers::{HttpBroker, HttpBrokerConfig, HttpInferenceClient, HttpInferenceConfig};
use gateway_resilience::{PatternClassifier, RetryPolicyBuilder};
use gateway_routing::{BrokerDirectory, ModelResolver, PinnedDirectory, ServiceDirectory};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, subscriber, LoggingConfig, Metrics, MetricsConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{info, warn};

/// ZG Inference Gateway - OpenAI-compatible access to the inference marketplace
#[derive(Parser, Debug)]
#[command(name = "zg-inference-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // The configured subscriber needs the config, so loading logs to a default one
    let config = load(&args)
        .with_subscriber(subscriber(&LoggingConfig::new()))
        .await?;

    init_logging(
        &LoggingConfig::new()
            .with_level(&config.logging.level)
            .with_json(config.logging.json),
    )
    .context("failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        "Starting ZG Inference Gateway"
    );

    run(config).await
}

async fn load(args: &Args) -> Result<GatewayConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load().await.context("failed to load configuration")?;

    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;

    Ok(config)
}

async fn run(config: GatewayConfig) -> Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        broker = %config.broker.url,
        "Configuration loaded"
    );

    let metrics = Metrics::new(&MetricsConfig::default())?;

    let mut broker_config =
        HttpBrokerConfig::new(&config.broker.url).with_timeout(config.broker.timeout);
    if let Some(token) = &config.broker.api_token {
        broker_config = broker_config.with_api_token(token.clone());
    }
    let broker = Arc::new(HttpBroker::new(broker_config)?);

    let transport = Arc::new(HttpInferenceClient::new(HttpInferenceConfig {
        timeout: config.completion.attempt_timeout,
    })?);

    let directory: Arc<dyn ServiceDirectory> = match &config.broker.provider {
        Some(provider) => {
            info!(provider = %provider, "Serving a single pinned provider");
            Arc::new(PinnedDirectory::new(broker.clone(), provider))
        }
        None => Arc::new(BrokerDirectory::new(broker.clone())),
    };
    let resolver = Arc::new(ModelResolver::new(directory).with_metrics(metrics.clone()));

    if config.broker.warm_cache {
        match resolver.refresh().await {
            Ok(count) => info!(services = count, "Service directory loaded"),
            Err(e) => warn!(error = %e, "Service directory unavailable, loading on first request"),
        }
    }

    let classifier = match &config.completion.fee_pattern {
        Some(pattern) => PatternClassifier::new()
            .with_fee_pattern(pattern)
            .context("invalid fee pattern")?,
        None => PatternClassifier::new(),
    };

    let policy = RetryPolicyBuilder::new()
        .max_attempts(config.completion.max_retries)
        .delay(config.completion.retry_delay)
        .attempt_timeout(config.completion.attempt_timeout)
        .build();

    let orchestrator = CompletionOrchestrator::new(broker, transport, resolver)
        .with_retry_policy(policy)
        .with_classifier(Arc::new(classifier))
        .with_metrics(metrics.clone());

    let server_config = ServerConfig::from(&config.server);
    let state = AppState::builder()
        .config(config)
        .orchestrator(Arc::new(orchestrator))
        .metrics(metrics)
        .build()?;

    Server::new(server_config, state).run().await?;
    Ok(())
}
