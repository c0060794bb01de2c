//! # Gateway Config
//!
//! Configuration for the ZG Inference Gateway.
//!
//! Configuration is layered: built-in defaults, then an optional YAML or TOML
//! file, then `GATEWAY_*` environment variables. The merged result is
//! validated before the gateway starts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod loader;

pub use config::{
    BrokerConfig, CompletionConfig, ConfigError, GatewayConfig, LoggingSettings, ServerSettings,
};
pub use loader::ConfigLoader;
