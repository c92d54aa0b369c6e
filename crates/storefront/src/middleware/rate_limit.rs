//! Per-client rate limiting for the storefront API.
//!
//! Each limited route group has a [`LimitPolicy`]; [`limiter`] turns one into a
//! `tower_governor` layer keyed by the client IP reported by the edge proxy.
//! The payment webhook is not limited; the provider retries on failure.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::key_extractor::KeyExtractor;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the client IP, most trusted first.
///
/// `x-forwarded-for` may hold a chain; its first hop is the client.
const CLIENT_IP_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "fly-client-ip",
    "x-forwarded-for",
    "x-real-ip",
];

/// Token bucket settings for one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    /// Seconds to replenish one request.
    pub replenish_secs: u64,
    /// Requests allowed back to back.
    pub burst: u32,
}

/// `POST /api/checkout`: about 10 a minute. Every call opens a provider
/// session, so this also shields the provider's own quota.
pub const CHECKOUT_POLICY: LimitPolicy = LimitPolicy {
    replenish_secs: 6,
    burst: 5,
};

/// Cart and catalog reads and writes: about 60 a minute with room for bursts
/// from a single page load.
pub const API_POLICY: LimitPolicy = LimitPolicy {
    replenish_secs: 1,
    burst: 50,
};

/// First parseable client IP from [`CLIENT_IP_HEADERS`].
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok()
    })
}

/// Keys requests by [`client_ip`].
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers()).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Build a limiter for `policy`.
///
/// # Panics
///
/// Panics if the policy has a zero period or burst; both policies above are
/// non-zero.
#[must_use]
pub fn limiter(policy: LimitPolicy) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(policy.replenish_secs)
        .burst_size(policy.burst)
        .finish()
        .expect("rate limit policy has a non-zero period and burst");
    GovernorLayer::new(Arc::new(config))
}
