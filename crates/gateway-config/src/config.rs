//! Configuration types.

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// File path
        path: String,
        /// Parser message
        message: String,
    },

    /// File extension is neither YAML nor TOML
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Environment variable holds an unusable value
    #[error("Invalid value for {var}: {message}")]
    Env {
        /// Variable name
        var: String,
        /// What was wrong
        message: String,
    },

    /// Semantic validation failed
    #[error("Invalid configuration: {field}: {message}")]
    Invalid {
        /// Offending field
        field: String,
        /// What was wrong
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for gateway_core::GatewayError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

/// Root gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Marketplace broker settings
    pub broker: BrokerConfig,
    /// Completion orchestration settings
    pub completion: CompletionConfig,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl GatewayConfig {
    /// Validate the merged configuration
    ///
    /// # Errors
    /// Returns the first invalid field found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.server.request_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "server.request_timeout",
                "must be greater than zero",
            ));
        }

        url::Url::parse(&self.broker.url)
            .map_err(|e| ConfigError::invalid("broker.url", e.to_string()))?;
        if self.broker.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "broker.timeout",
                "must be greater than zero",
            ));
        }
        if self
            .broker
            .provider
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "broker.provider",
                "must not be empty when set",
            ));
        }

        if self.completion.max_retries == 0 {
            return Err(ConfigError::invalid(
                "completion.max_retries",
                "must be at least 1",
            ));
        }
        if self.completion.attempt_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "completion.attempt_timeout",
                "must be greater than zero",
            ));
        }
        if let Some(pattern) = &self.completion.fee_pattern {
            let regex = regex::Regex::new(pattern)
                .map_err(|e| ConfigError::invalid("completion.fee_pattern", e.to_string()))?;
            // captures_len counts the implicit whole-match group
            if regex.captures_len() < 2 {
                return Err(ConfigError::invalid(
                    "completion.fee_pattern",
                    "must contain a capture group for the amount",
                ));
            }
        }

        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Outer bound for a whole HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Allow cross-origin requests
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(300),
            cors_enabled: true,
        }
    }
}

/// Marketplace broker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker sidecar base URL
    pub url: String,
    /// Bearer token for the broker sidecar
    pub api_token: Option<SecretString>,
    /// Timeout for a single broker call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Pinned provider address; resolves via service metadata when set
    pub provider: Option<String>,
    /// Load the service directory at startup
    pub warm_cache: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3080".to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            provider: None,
            warm_cache: true,
        }
    }
}

/// Completion orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Maximum attempts per request
    pub max_retries: u32,
    /// Fixed wait between attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Bound on signing plus calling for one attempt
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,
    /// Override for the fee-shortfall pattern; group 1 is the amount
    pub fee_pattern: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
            fee_pattern: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.completion.max_retries, 3);
        assert_eq!(config.completion.retry_delay, Duration::from_secs(1));
        assert!(config.broker.warm_cache);
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = GatewayConfig::default();
        config.completion.max_retries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("completion.max_retries"));
    }

    #[test]
    fn test_bad_broker_url_rejected() {
        let mut config = GatewayConfig::default();
        config.broker.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fee_pattern_needs_group() {
        let mut config = GatewayConfig::default();
        config.completion.fee_pattern = Some(r"expected \d+".to_string());
        assert!(config.validate().is_err());

        config.completion.fee_pattern = Some(r"expected (\d+)".to_string());
        assert!(config.validate().is_ok());

        config.completion.fee_pattern = Some(r"expected (\d+".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_pinned_provider_rejected() {
        let mut config = GatewayConfig::default();
        config.broker.provider = Some(" ".to_string());
        assert!(config.validate().is_err());
    }
}
