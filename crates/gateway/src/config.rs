//! Gateway configuration.
//!
//! Configuration is loaded from environment variables. All sensitive
//! fields are redacted in Debug output.

use axum::http::HeaderValue;
use common::jwt::MIN_SIGNING_SECRET_BYTES;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default credential lifetime in seconds (24 hours).
pub const DEFAULT_JWT_TTL_SECONDS: i64 = 86_400;

/// Default remaining lifetime below which a credential is re-issued (30 minutes).
pub const DEFAULT_SESSION_RENEWAL_THRESHOLD_SECONDS: i64 = 1_800;

/// Upper bound for `JWT_TTL_SECONDS` (ten years). Larger values overflow
/// timestamp arithmetic.
pub const MAX_JWT_TTL_SECONDS: i64 = 315_360_000;

/// Default registry sweep interval in seconds.
pub const DEFAULT_REGISTRY_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Default upstream request timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

/// Default per-client token replenish rate (requests per second).
pub const DEFAULT_RATE_LIMIT_PER_SECOND: u64 = 20;

/// Default per-client burst capacity.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 200;

/// Upper bound for `GATEWAY_RATE_LIMIT_PER_SECOND`; the limiter counts in
/// whole milliseconds per token.
pub const MAX_RATE_LIMIT_PER_SECOND: u64 = 1_000;

/// Per-client rate limiting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Tokens replenished per second.
    pub per_second: u64,
    /// Maximum tokens a client can hold.
    pub burst: u32,
}

/// Origins allowed by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`*`).
    Any,
    /// An explicit allow-list.
    List(Vec<HeaderValue>),
}

/// One `prefix=url` entry of `UPSTREAM_ROUTES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRoute {
    /// Path prefix, always starting with `/` and without a trailing `/`
    /// (except for the root route itself).
    pub prefix: String,
    /// Base URL of the upstream service, without a trailing `/`.
    pub target: String,
}

/// Gateway configuration.
///
/// Loaded from environment variables with sensible defaults.
/// Both secrets are redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// HS256 signing secret for credentials.
    /// Protected by `SecretString` to prevent accidental logging.
    pub jwt_secret: SecretString,

    /// Shared secret attached to every forwarded request.
    /// Protected by `SecretString` to prevent accidental logging.
    pub gateway_secret: SecretString,

    /// Lifetime of issued credentials in seconds (default: 86400).
    pub jwt_ttl_seconds: i64,

    /// Remaining lifetime below which renewal re-issues (default: 1800).
    pub session_renewal_threshold_seconds: i64,

    /// Interval between registry sweeps in seconds (default: 60).
    pub registry_sweep_interval_seconds: u64,

    /// Require a live registry entry in addition to a valid signature
    /// (default: false).
    pub require_session: bool,

    /// Upstream route table, in configuration order.
    pub upstream_routes: Vec<UpstreamRoute>,

    /// Upstream request timeout in seconds (default: 30).
    pub upstream_timeout_seconds: u64,

    /// Seconds to wait after a shutdown signal before stopping (default: 0).
    pub drain_seconds: u64,

    /// Per-client rate limit, `None` when disabled (default: 20/s, burst 200).
    pub rate_limit: Option<RateLimit>,

    /// Origins allowed cross-origin (default: any).
    pub cors_origins: CorsOrigins,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("gateway_secret", &"[REDACTED]")
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field(
                "session_renewal_threshold_seconds",
                &self.session_renewal_threshold_seconds,
            )
            .field(
                "registry_sweep_interval_seconds",
                &self.registry_sweep_interval_seconds,
            )
            .field("require_session", &self.require_session)
            .field("upstream_routes", &self.upstream_routes)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .field("rate_limit", &self.rate_limit)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Invalid upstream routes: {0}")]
    InvalidUpstreamRoutes(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = SecretString::from(
            vars.get("JWT_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?
                .clone(),
        );

        if jwt_secret.expose_secret().len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "JWT_SECRET must be at least {MIN_SIGNING_SECRET_BYTES} bytes"
            )));
        }

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

        // Sent verbatim as a header value on every forwarded request
        if HeaderValue::from_str(gateway_secret.expose_secret()).is_err() {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_SECRET must contain only visible ASCII characters".to_string(),
            ));
        }

        let bind_address = vars
            .get("GATEWAY_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_ttl_seconds =
            parse_positive(vars, "JWT_TTL_SECONDS", DEFAULT_JWT_TTL_SECONDS)?;

        if jwt_ttl_seconds > MAX_JWT_TTL_SECONDS {
            return Err(ConfigError::InvalidValue(format!(
                "JWT_TTL_SECONDS must be at most {MAX_JWT_TTL_SECONDS}, got {jwt_ttl_seconds}"
            )));
        }

        let session_renewal_threshold_seconds = parse_positive(
            vars,
            "SESSION_RENEWAL_THRESHOLD_SECONDS",
            DEFAULT_SESSION_RENEWAL_THRESHOLD_SECONDS,
        )?;

        if session_renewal_threshold_seconds >= jwt_ttl_seconds {
            return Err(ConfigError::InvalidValue(format!(
                "SESSION_RENEWAL_THRESHOLD_SECONDS ({session_renewal_threshold_seconds}) must be \
                 less than JWT_TTL_SECONDS ({jwt_ttl_seconds})"
            )));
        }

        let registry_sweep_interval_seconds = parse_positive(
            vars,
            "REGISTRY_SWEEP_INTERVAL_SECONDS",
            DEFAULT_REGISTRY_SWEEP_INTERVAL_SECONDS,
        )?;

        let require_session = match vars.get("GATEWAY_REQUIRE_SESSION") {
            None => false,
            Some(value) => value.parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "GATEWAY_REQUIRE_SESSION must be 'true' or 'false', got '{value}': {e}"
                ))
            })?,
        };

        let upstream_routes = parse_upstream_routes(
            vars.get("UPSTREAM_ROUTES")
                .ok_or_else(|| ConfigError::MissingEnvVar("UPSTREAM_ROUTES".to_string()))?,
        )?;

        let upstream_timeout_seconds = parse_positive(
            vars,
            "UPSTREAM_TIMEOUT_SECONDS",
            DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
        )?;

        let drain_seconds = match vars.get("GATEWAY_DRAIN_SECONDS") {
            None => 0,
            Some(value) => value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "GATEWAY_DRAIN_SECONDS must be a non-negative integer, got '{value}': {e}"
                ))
            })?,
        };

        let rate_limit_enabled = match vars.get("GATEWAY_RATE_LIMIT_ENABLED") {
            None => true,
            Some(value) => value.parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "GATEWAY_RATE_LIMIT_ENABLED must be 'true' or 'false', got '{value}': {e}"
                ))
            })?,
        };

        let rate_limit = if rate_limit_enabled {
            let per_second = parse_positive(
                vars,
                "GATEWAY_RATE_LIMIT_PER_SECOND",
                DEFAULT_RATE_LIMIT_PER_SECOND,
            )?;
            if per_second > MAX_RATE_LIMIT_PER_SECOND {
                return Err(ConfigError::InvalidValue(format!(
                    "GATEWAY_RATE_LIMIT_PER_SECOND must be at most \
                     {MAX_RATE_LIMIT_PER_SECOND}, got {per_second}"
                )));
            }
            let burst = parse_positive(vars, "GATEWAY_RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST)?;
            Some(RateLimit { per_second, burst })
        } else {
            None
        };

        let cors_origins =
            parse_cors_origins(vars.get("CORS_ALLOWED_ORIGINS").map(String::as_str))?;

        Ok(Config {
            bind_address,
            jwt_secret,
            gateway_secret,
            jwt_ttl_seconds,
            session_renewal_threshold_seconds,
            registry_sweep_interval_seconds,
            require_session,
            upstream_routes,
            upstream_timeout_seconds,
            drain_seconds,
            rate_limit,
            cors_origins,
        })
    }
}

/// Parse `CORS_ALLOWED_ORIGINS`: unset or `*` allows any origin, otherwise a
/// comma-separated list of origins.
fn parse_cors_origins(raw: Option<&str>) -> Result<CorsOrigins, ConfigError> {
    let raw = match raw.map(str::trim) {
        None | Some("*") => return Ok(CorsOrigins::Any),
        Some(raw) => raw,
    };

    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(ConfigError::InvalidValue(
                    "CORS_ALLOWED_ORIGINS cannot mix '*' with explicit origins".to_string(),
                ));
            }
            HeaderValue::from_str(origin).map_err(|_| {
                ConfigError::InvalidValue(format!("invalid CORS origin '{origin}'"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::InvalidValue(
            "CORS_ALLOWED_ORIGINS must name at least one origin".to_string(),
        ));
    }

    Ok(CorsOrigins::List(origins))
}

/// Parse an optional, strictly positive integer variable.
fn parse_positive<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: fmt::Display,
{
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e| {
        ConfigError::InvalidValue(format!(
            "{name} must be a valid positive integer, got '{value_str}': {e}"
        ))
    })?;

    if value <= T::default() {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be greater than 0, got '{value_str}'"
        )));
    }

    Ok(value)
}

/// Parse `prefix=url,prefix=url`.
fn parse_upstream_routes(raw: &str) -> Result<Vec<UpstreamRoute>, ConfigError> {
    let mut routes = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (prefix, target) = entry.split_once('=').ok_or_else(|| {
            ConfigError::InvalidUpstreamRoutes(format!("expected 'prefix=url', got '{entry}'"))
        })?;
        let prefix = prefix.trim();
        let target = target.trim();

        if !prefix.starts_with('/') {
            return Err(ConfigError::InvalidUpstreamRoutes(format!(
                "prefix must start with '/', got '{prefix}'"
            )));
        }

        if !(target.starts_with("http://") || target.starts_with("https://")) {
            return Err(ConfigError::InvalidUpstreamRoutes(format!(
                "target must be an http(s) URL, got '{target}'"
            )));
        }

        let prefix = match prefix.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        if routes.iter().any(|r: &UpstreamRoute| r.prefix == prefix) {
            return Err(ConfigError::InvalidUpstreamRoutes(format!(
                "duplicate prefix '{prefix}'"
            )));
        }

        routes.push(UpstreamRoute {
            prefix: prefix.to_string(),
            target: target.trim_end_matches('/').to_string(),
        });
    }

    if routes.is_empty() {
        return Err(ConfigError::InvalidUpstreamRoutes(
            "at least one route is required".to_string(),
        ));
    }

    Ok(routes)
}
