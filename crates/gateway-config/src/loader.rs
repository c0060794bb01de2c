//! Layered configuration loading.

use crate::config::{ConfigError, GatewayConfig};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Builder-style configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// Create a loader with no file and environment overrides enabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this YAML or TOML file
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Ignore `GATEWAY_*` environment variables
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load, merge, and validate
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, an environment
    /// override is malformed, or the merged config is invalid
    pub async fn load(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => read_file(path).await?,
            None => GatewayConfig::default(),
        };

        if !self.skip_env {
            apply_env(&mut config, |var| std::env::var(var).ok())?;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn read_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let display = path.display().to_string();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let config = match extension.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        }
        "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            message: e.to_string(),
        })?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    let loaded_path = &display;
    info!(path = %loaded_path, "Loaded configuration file");
    Ok(config)
}

/// Apply `GATEWAY_*` overrides using `lookup` to read variables
pub(crate) fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("GATEWAY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("GATEWAY_PORT") {
        config.server.port = parse_env("GATEWAY_PORT", &port)?;
    }
    if let Some(url) = lookup("GATEWAY_BROKER_URL") {
        config.broker.url = url;
    }
    if let Some(token) = lookup("GATEWAY_BROKER_TOKEN") {
        config.broker.api_token = Some(SecretString::new(token));
    }
    if let Some(provider) = lookup("GATEWAY_PROVIDER") {
        config.broker.provider = Some(provider);
    }
    if let Some(retries) = lookup("GATEWAY_MAX_RETRIES") {
        config.completion.max_retries = parse_env("GATEWAY_MAX_RETRIES", &retries)?;
    }
    if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("GATEWAY_LOG_JSON") {
        config.logging.json = parse_env("GATEWAY_LOG_JSON", &json)?;
    }

    debug!("Applied environment overrides");
    Ok(())
}

fn parse_env<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var: var.to_string(),
        message: e.to_string(),
    })
}
