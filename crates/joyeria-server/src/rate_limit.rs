//! Per-client request throttling.
//!
//! Each client IP owns a bucket holding at most one window's worth of
//! requests. The bucket refills continuously at `max / window`, so a client
//! that stays under the quota is never blocked and a burst is capped at `max`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        header::{HeaderName, RETRY_AFTER},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use joyeria_shared::protocol::ErrorBody;

const TOO_MANY_REQUESTS: &str = "Demasiadas solicitudes, intenta más tarde";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Requests allowed per window, and the derived refill speed.
#[derive(Debug, Clone, Copy)]
struct Quota {
    burst: f64,
    per_sec: f64,
}

#[derive(Debug)]
struct Allowance {
    remaining: f64,
    seen: Instant,
}

impl Allowance {
    fn full(quota: Quota, now: Instant) -> Self {
        Self {
            remaining: quota.burst,
            seen: now,
        }
    }

    /// Credit the time elapsed since the last request, then spend one unit.
    fn spend(&mut self, quota: Quota, now: Instant) -> Verdict {
        let idle = now.saturating_duration_since(self.seen).as_secs_f64();
        self.seen = now;
        self.remaining = quota.burst.min(self.remaining + idle * quota.per_sec);

        let admitted = self.remaining >= 1.0;
        if admitted {
            self.remaining -= 1.0;
        }

        let until = |units: f64| (units.max(0.0) / quota.per_sec).ceil() as u64;
        Verdict {
            admitted,
            limit: quota.burst as u64,
            remaining: self.remaining.floor() as u64,
            reset_secs: until(quota.burst - self.remaining),
            retry_after_secs: until(1.0 - self.remaining).max(1),
        }
    }
}

/// Outcome of one request against a client's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub admitted: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until the quota is full again.
    pub reset_secs: u64,
    /// Seconds until the next request would be admitted.
    pub retry_after_secs: u64,
}

impl Verdict {
    /// `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset`, plus
    /// `Retry-After` on rejection.
    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(self.reset_secs));
        if !self.admitted {
            headers.insert(RETRY_AFTER, HeaderValue::from(self.retry_after_secs));
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    quota: Quota,
    clients: Arc<Mutex<HashMap<IpAddr, Allowance>>>,
}

impl RateLimiter {
    /// `max` requests per `window` for each client IP.
    pub fn per_window(max: u32, window: Duration) -> Self {
        let burst = f64::from(max.max(1));
        let secs = window.as_secs_f64().max(f64::EPSILON);
        Self {
            quota: Quota {
                burst,
                per_sec: burst / secs,
            },
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a request from `ip`. `admitted` is false once the quota is
    /// spent.
    pub async fn admit(&self, ip: IpAddr) -> Verdict {
        let now = Instant::now();
        let quota = self.quota;
        self.clients
            .lock()
            .await
            .entry(ip)
            .or_insert_with(|| Allowance::full(quota, now))
            .spend(quota, now)
    }

    /// Forget clients that have been quiet for at least `max_idle`.
    pub async fn purge_stale(&self, max_idle: Duration) {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, a| now.saturating_duration_since(a.seen) < max_idle);
        let evicted = before - clients.len();
        if evicted > 0 {
            debug!(evicted, tracked = clients.len(), "purged idle rate-limit entries");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_window(80, Duration::from_secs(60))
    }
}

/// Rejects with 429 once the caller's quota is spent. Requests whose origin
/// cannot be determined pass through.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .or_else(|| forwarded_ip(req.headers()));

    let Some(ip) = ip else {
        return next.run(req).await;
    };

    let verdict = limiter.admit(ip).await;
    let mut response = if verdict.admitted {
        next.run(req).await
    } else {
        warn!(ip = %ip, path = %req.uri().path(), "rate limit exceeded");
        let body = ErrorBody {
            message: TOO_MANY_REQUESTS.to_string(),
            errors: None,
        };
        (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
    };
    verdict.write_headers(response.headers_mut());
    response
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("x-real-ip").and_then(|v| v.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_burst_is_capped_at_max() {
        let limiter = RateLimiter::per_window(3, Duration::from_secs(3600));
        let client = ip("10.0.0.9");

        for _ in 0..3 {
            assert!(limiter.admit(client).await.admitted);
        }
        assert!(!limiter.admit(client).await.admitted);
    }

    #[tokio::test]
    async fn test_clients_have_separate_quotas() {
        let limiter = RateLimiter::per_window(1, Duration::from_secs(3600));

        assert!(limiter.admit(ip("10.0.0.1")).await.admitted);
        assert!(!limiter.admit(ip("10.0.0.1")).await.admitted);
        assert!(limiter.admit(ip("10.0.0.2")).await.admitted);
    }

    #[test]
    fn test_allowance_refills_with_time() {
        let quota = Quota {
            burst: 2.0,
            per_sec: 1.0,
        };
        let start = Instant::now();
        let mut allowance = Allowance::full(quota, start);

        assert!(allowance.spend(quota, start).admitted);
        assert!(allowance.spend(quota, start).admitted);
        assert!(!allowance.spend(quota, start).admitted);

        let later = start + Duration::from_secs(1);
        assert!(allowance.spend(quota, later).admitted);

        let much_later = later + Duration::from_secs(60);
        assert!(allowance.spend(quota, much_later).admitted);
        assert!(allowance.spend(quota, much_later).admitted);
        assert!(!allowance.spend(quota, much_later).admitted);
    }

    #[test]
    fn test_verdict_reports_quota() {
        let quota = Quota {
            burst: 2.0,
            per_sec: 0.5,
        };
        let now = Instant::now();
        let mut allowance = Allowance::full(quota, now);

        let first = allowance.spend(quota, now);
        assert_eq!(
            (first.admitted, first.limit, first.remaining, first.reset_secs),
            (true, 2, 1, 2)
        );

        allowance.spend(quota, now);
        let rejected = allowance.spend(quota, now);
        assert!(!rejected.admitted);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.reset_secs, 4);
        assert_eq!(rejected.retry_after_secs, 2);

        let mut headers = HeaderMap::new();
        rejected.write_headers(&mut headers);
        assert_eq!(headers["ratelimit-limit"], "2");
        assert_eq!(headers["ratelimit-remaining"], "0");
        assert_eq!(headers["ratelimit-reset"], "4");
        assert_eq!(headers[RETRY_AFTER], "2");

        let mut headers = HeaderMap::new();
        first.write_headers(&mut headers);
        assert!(headers.get(RETRY_AFTER).is_none());
    }

    #[tokio::test]
    async fn test_purge_drops_idle_clients() {
        let limiter = RateLimiter::default();
        assert!(limiter.admit(ip("192.168.1.1")).await.admitted);

        limiter.purge_stale(Duration::from_secs(600)).await;
        assert_eq!(limiter.clients.lock().await.len(), 1);

        limiter.purge_stale(Duration::ZERO).await;
        assert!(limiter.clients.lock().await.is_empty());
    }

    #[test]
    fn test_forwarded_headers_identify_the_client() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static(" 198.51.100.2 "));
        assert_eq!(forwarded_ip(&headers), Some(ip("198.51.100.2")));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_ip(&headers), Some(ip("203.0.113.7")));
    }
}
