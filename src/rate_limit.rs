//! Request pacing for the Zotero Web API.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Rate limiter that spaces requests and honours server back-off.
///
/// Keeps a minimum interval between requests. Zotero may also send a
/// `Backoff` header (or `Retry-After` on 429/503) asking clients to pause;
/// the next [`acquire`](Self::acquire) waits until that deadline passes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

#[derive(Debug)]
struct RateLimiterInner {
    /// Minimum spacing between requests.
    min_interval: Duration,
    /// Time of the last request.
    last_request: Option<Instant>,
    /// No request may be sent before this instant.
    backoff_until: Option<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given maximum requests per second.
    ///
    /// A rate that is zero, negative or NaN disables spacing; server back-off
    /// still applies.
    pub fn new(max_per_second: f64) -> Self {
        let min_interval = if max_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / max_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                min_interval,
                last_request: None,
                backoff_until: None,
            })),
        }
    }

    /// Wait until a request is allowed, then mark it as sent.
    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(until) = inner.backoff_until.take() {
            let now = Instant::now();
            if now < until {
                drop(inner);
                tokio::time::sleep(until - now).await;
                inner = self.inner.lock().await;
            }
        }

        if let Some(last) = inner.last_request {
            let elapsed = last.elapsed();
            if elapsed < inner.min_interval {
                let wait = inner.min_interval - elapsed;
                drop(inner);
                tokio::time::sleep(wait).await;
                inner = self.inner.lock().await;
            }
        }

        inner.last_request = Some(Instant::now());
    }

    /// Record a server-requested pause, keeping the later deadline.
    pub async fn back_off(&self, wait: Duration) {
        let mut inner = self.inner.lock().await;
        let until = Instant::now() + wait;
        inner.backoff_until = Some(match inner.backoff_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    /// Update the limiter from the headers of a Zotero API response.
    pub async fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let wait = ["backoff", "retry-after"]
            .iter()
            .filter_map(|name| header_seconds(headers, name))
            .max();

        if let Some(wait) = wait {
            tracing::warn!(seconds = wait.as_secs(), "Zotero asked the client to back off");
            self.back_off(wait).await;
        }
    }
}

/// Parse a header holding a whole number of seconds.
pub(crate) fn header_seconds(headers: &reqwest::header::HeaderMap, name: &str) -> Option<Duration> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
