//! Retry policies for marketplace requests
//!
//! Each marketplace surface gets its own backoff; a throttling response can
//! override the computed delay through `Retry-After` or `X-RateLimit-Reset`.

use rand::Rng;
use reqwest::header::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How the wait grows between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed,
    /// `base * factor^attempt`
    Exponential { factor: f64 },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Ceiling for both computed and server-requested waits
    pub max_delay: Duration,
    pub backoff: Backoff,
    /// Random extra wait as a fraction of the computed delay (0.0 disables)
    pub jitter: f64,
}

impl RetryPolicy {
    /// Structured data API: short base delay, a few retries
    pub fn marketplace_api() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff: Backoff::Exponential { factor: 2.0 },
            jitter: 0.1,
        }
    }

    /// Result pages sit behind anti-automation checks, so back off harder
    pub fn marketplace_pages() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(120),
            backoff: Backoff::Exponential { factor: 2.5 },
            jitter: 0.25,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
            jitter: 0.0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Wait before retry number `attempt` (0-based); a server hint takes precedence
    pub fn calculate_delay(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        if let Some(hint) = server_hint {
            return hint.min(self.max_delay);
        }

        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential { factor } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                self.base_delay.mul_f64(factor.powi(exponent).min(1e6))
            }
        };

        let delay = if self.jitter > 0.0 {
            delay.mul_f64(1.0 + rand::thread_rng().gen_range(0.0..self.jitter))
        } else {
            delay
        };

        delay.min(self.max_delay)
    }
}

/// Throttling hints carried by a 429 response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    /// `Retry-After`, in seconds
    pub retry_after: Option<Duration>,
    /// Time left until the `X-RateLimit-Reset` epoch timestamp
    pub reset_after: Option<Duration>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            retry_after: header_u64(headers, "retry-after").map(Duration::from_secs),
            reset_after: header_u64(headers, "x-ratelimit-reset")
                .map(|reset_at| Duration::from_secs(reset_at.saturating_sub(now))),
        }
    }

    pub fn recommended_delay(&self) -> Option<Duration> {
        self.retry_after.or(self.reset_after)
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Timeouts and refused connections are worth another attempt; other transport errors are not
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    match error.status() {
        Some(status) => status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error(),
        None => error.is_timeout() || error.is_connect(),
    }
}
