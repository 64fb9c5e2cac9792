//! QA service configuration.
//!
//! Loaded from environment variables. The gateway secret must match the
//! value the gateway is configured with.

use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8082";

/// QA service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address.
    pub bind_address: String,

    /// Shared secret the gateway attaches to every forwarded request.
    pub gateway_secret: SecretString,

    /// Seconds to wait after a shutdown signal before stopping (default: 0).
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("gateway_secret", &"[REDACTED]")
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from a variable map.
    ///
    /// # Errors
    ///
    /// - `MissingEnvVar` if `GATEWAY_SECRET` is unset
    /// - `InvalidValue` if `GATEWAY_SECRET` is empty or `QA_DRAIN_SECONDS`
    ///   is not a non-negative integer
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let gateway_secret = SecretString::from(
            vars.get("GATEWAY_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("GATEWAY_SECRET".to_string()))?
                .clone(),
        );
        if gateway_secret.expose_secret().is_empty() {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_SECRET must not be empty".to_string(),
            ));
        }

        let bind_address = vars
            .get("QA_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let drain_seconds = match vars.get("QA_DRAIN_SECONDS") {
            None => 0,
            Some(value) => value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "QA_DRAIN_SECONDS must be a non-negative integer, got '{value}': {e}"
                ))
            })?,
        };

        Ok(Self {
            bind_address,
            gateway_secret,
            drain_seconds,
        })
    }
}
