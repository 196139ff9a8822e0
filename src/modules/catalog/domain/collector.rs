use super::entities::{BookRecord, CollectionParameters};
use async_trait::async_trait;
use thiserror::Error;

/// Strategy-level failures; recorded in the job's `errorMessage` once a job exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Rate limit exceeded: {message}{}", retry_hint(.retry_after_secs))]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl CollectorError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        CollectorError::RateLimit {
            message: message.into(),
            retry_after_secs: None,
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(" (retry after {}s)", secs))
        .unwrap_or_default()
}

/// The single capability both acquisition strategies share.
///
/// Implementations hold no per-invocation mutable state, so one instance can serve
/// concurrent jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCollector: Send + Sync {
    async fn collect(
        &self,
        query: &CollectionParameters,
    ) -> Result<Vec<BookRecord>, CollectorError>;
}
