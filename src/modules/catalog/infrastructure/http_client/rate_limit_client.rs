//! HTTP client with automatic rate limiting and retry logic
//!
//! Shared by both collection strategies. Throttling happens before every attempt;
//! 429 responses, 5xx responses and transient network errors are retried according
//! to the `RetryPolicy`. Any other response is handed back to the caller, which
//! decides what the status means for its strategy.

use super::retry_policy::{is_retryable_error, RateLimitInfo, RetryPolicy};
use crate::modules::catalog::domain::CollectorError;
use crate::shared::utils::logger::{LogContext, TimedOperation};
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter as GovernorRateLimiter,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::sleep;

pub type DirectRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

const DEFAULT_USER_AGENT: &str = "shelfscout/0.1 (+https://github.com/shelfscout/shelfscout)";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limited HTTP client for one marketplace source
pub struct RateLimitClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    retry_policy: RetryPolicy,
    user_agent: String,
    headers: Vec<(&'static str, String)>,
    source_name: String,
}

impl RateLimitClient {
    /// Client for the structured marketplace data API
    pub fn for_marketplace_api(requests_per_second: f64, api_key: Option<&str>) -> Self {
        let client = Self::new(
            "Marketplace API",
            RetryPolicy::marketplace_api(),
            Self::create_rate_limiter(requests_per_second, 2),
            DEFAULT_USER_AGENT.to_string(),
        )
        .with_header("Accept", "application/json");

        match api_key {
            Some(key) => client.with_header("X-Api-Key", key),
            None => client,
        }
    }

    /// Client for marketplace result pages
    pub fn for_marketplace_pages(requests_per_second: f64) -> Self {
        Self::new(
            "Marketplace pages",
            RetryPolicy::marketplace_pages(),
            Self::create_rate_limiter(requests_per_second, 1),
            BROWSER_USER_AGENT.to_string(),
        )
        .with_header("Accept", "text/html,application/xhtml+xml")
        .with_header("Accept-Language", "en-US,en;q=0.9")
    }

    /// Create a rate limiter with specified requests per second and burst capacity
    pub fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);

        let quota = if requests_per_second > 0.0 {
            Quota::with_period(Duration::from_secs_f64(1.0 / requests_per_second))
                .map(|quota| quota.allow_burst(burst))
        } else {
            None
        };

        // A zero period cannot form a quota; fall back to one request per second
        GovernorRateLimiter::direct(quota.unwrap_or_else(|| Quota::per_second(burst)))
    }

    /// Create a custom client
    pub fn new(
        source_name: &str,
        retry_policy: RetryPolicy,
        rate_limiter: DirectRateLimiter,
        user_agent: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter,
            retry_policy,
            user_agent,
            headers: Vec::new(),
            source_name: source_name.to_string(),
        }
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// GET with rate limiting and retries.
    ///
    /// Returns the final response for any status other than 429; exhausting the
    /// retries on 429 yields `CollectorError::RateLimit`.
    pub async fn get(&self, url: &str) -> Result<Response, CollectorError> {
        let mut last_error = None;

        for attempt in 0..=self.retry_policy.max_retries {
            self.rate_limiter.until_ready().await;

            let timer = TimedOperation::new(&format!("{} GET", self.source_name));
            match self.send(url).await {
                Ok(response) => {
                    let status = response.status();
                    LogContext::api_call(
                        &self.source_name,
                        url,
                        status.as_str(),
                        Some(timer.elapsed_ms()),
                    );

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let rate_limit_info = RateLimitInfo::from_headers(response.headers());

                        if attempt < self.retry_policy.max_retries {
                            let delay = self.calculate_retry_delay(attempt, &rate_limit_info);
                            log::warn!(
                                "{} rate limited (attempt {}/{}). Waiting {:?} before retry.",
                                self.source_name,
                                attempt + 1,
                                self.retry_policy.attempts(),
                                delay
                            );
                            sleep(delay).await;
                            continue;
                        }

                        return Err(CollectorError::RateLimit {
                            message: format!(
                                "{} throttled the request after {} attempts",
                                self.source_name,
                                self.retry_policy.attempts()
                            ),
                            retry_after_secs: rate_limit_info
                                .recommended_delay()
                                .map(|d| d.as_secs()),
                        });
                    }

                    if status.is_server_error() && attempt < self.retry_policy.max_retries {
                        let delay = self.retry_policy.calculate_delay(attempt, None);
                        log::warn!(
                            "{} returned {} (attempt {}/{}). Retrying in {:?}",
                            self.source_name,
                            status,
                            attempt + 1,
                            self.retry_policy.attempts(),
                            delay
                        );
                        sleep(delay).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if is_retryable_error(&e) && attempt < self.retry_policy.max_retries {
                        let delay = self.retry_policy.calculate_delay(attempt, None);
                        log::warn!(
                            "{} request failed (attempt {}/{}): {}. Retrying in {:?}",
                            self.source_name,
                            attempt + 1,
                            self.retry_policy.attempts(),
                            e,
                            delay
                        );
                        last_error = Some(e);
                        sleep(delay).await;
                        continue;
                    }

                    return Err(CollectorError::Upstream(format!(
                        "{} request failed: {}",
                        self.source_name, e
                    )));
                }
            }
        }

        Err(CollectorError::Upstream(format!(
            "{} request failed after {} attempts: {}",
            self.source_name,
            self.retry_policy.attempts(),
            last_error.map_or_else(|| "unknown error".to_string(), |e| e.to_string())
        )))
    }

    async fn send(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut request_builder = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent);

        for (name, value) in &self.headers {
            request_builder = request_builder.header(*name, value);
        }

        request_builder.send().await
    }

    /// Read a successful response body as JSON
    pub async fn parse_json<T>(&self, response: Response) -> Result<T, CollectorError>
    where
        T: DeserializeOwned,
    {
        let response_text = self.read_text(response).await?;

        serde_json::from_str(&response_text).map_err(|e| {
            CollectorError::Upstream(format!(
                "Failed to parse {} response: {}. Response: {}",
                self.source_name,
                e,
                truncate(&response_text, 200)
            ))
        })
    }

    /// Read a response body as text
    pub async fn read_text(&self, response: Response) -> Result<String, CollectorError> {
        response.text().await.map_err(|e| {
            CollectorError::Upstream(format!(
                "Failed to read {} response: {}",
                self.source_name, e
            ))
        })
    }

    /// Calculate delay for retry based on rate limit info and policy
    fn calculate_retry_delay(&self, attempt: u32, rate_limit_info: &RateLimitInfo) -> Duration {
        self.retry_policy
            .calculate_delay(attempt, rate_limit_info.recommended_delay())
    }

    /// Check if a request can be made now without waiting
    pub fn can_make_request_now(&self) -> bool {
        self.rate_limiter.check().is_ok()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
