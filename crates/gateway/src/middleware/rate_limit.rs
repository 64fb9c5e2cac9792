//! Per-client rate limiting.
//!
//! Token bucket per transport peer address, enforced by `tower_governor`.
//! Forwarding headers are not trusted for the key: any client could set them.

use crate::config::{ConfigError, RateLimit};
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_governor::{
    errors::GovernorError, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
    GovernorLayer,
};

/// Key for requests without a peer address (in-process tests).
const UNKNOWN_PEER: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Keys the bucket on the connection's peer IP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(UNKNOWN_PEER, |ConnectInfo(addr)| addr.ip()))
    }
}

/// Wrap `router` in the rate limiting layer.
///
/// Rejections are 429 with `x-ratelimit-after`; allowed responses carry
/// `x-ratelimit-limit` and `x-ratelimit-remaining`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the quota is rejected by the
/// limiter (zero rate or burst).
pub fn with_rate_limit(router: Router, limit: RateLimit) -> Result<Router, ConfigError> {
    let replenish_ms = 1_000 / limit.per_second.max(1);

    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(limit.burst)
        .key_extractor(ClientIpKeyExtractor)
        .use_headers()
        .finish()
        .ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "rate limit {}/s with burst {} is not a valid quota",
                limit.per_second, limit.burst
            ))
        })?;

    tracing::info!(
        target: "gateway.middleware.rate_limit",
        per_second = limit.per_second,
        burst = limit.burst,
        "Rate limiting enabled"
    );

    Ok(router.layer(GovernorLayer {
        config: Arc::new(config),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_peer_ip_not_forwarded_header() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 5123))));

        assert_eq!(
            ClientIpKeyExtractor.extract(&request).unwrap(),
            IpAddr::from([10, 0, 0, 7])
        );
    }

    #[test]
    fn test_key_without_peer_falls_back() {
        let request = Request::builder().body(()).unwrap();

        assert_eq!(ClientIpKeyExtractor.extract(&request).unwrap(), UNKNOWN_PEER);
    }

    #[test]
    fn test_zero_burst_rejected() {
        let result = with_rate_limit(
            Router::new(),
            RateLimit {
                per_second: 10,
                burst: 0,
            },
        );

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
