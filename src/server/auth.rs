//! Bearer token authentication
//!
//! Requests must carry `Authorization: Bearer <token>` (or `X-API-Key: <token>`)
//! matching one of the configured tokens. The resolved `CallerIdentity` is
//! stored in the request extensions for handlers.

use crate::shared::errors::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
}

/// Resolves request headers to a caller identity
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<CallerIdentity>;
}

/// Fixed set of accepted tokens
pub struct StaticTokenAuth {
    tokens: Vec<String>,
}

impl StaticTokenAuth {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    fn presented_token(headers: &HeaderMap) -> Option<&str> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        bearer
            .or_else(|| headers.get("X-API-Key").and_then(|v| v.to_str().ok()))
            .filter(|token| !token.is_empty())
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        let presented = Self::presented_token(headers)?;

        self.tokens
            .iter()
            .position(|token| constant_time_eq(token.as_bytes(), presented.as_bytes()))
            .map(|index| CallerIdentity {
                subject: format!("token-{}", index + 1),
            })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting requests without a valid identity
pub async fn require_identity(
    State(auth): State<Arc<dyn AuthProvider>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match auth.authenticate(request.headers()).await {
        Some(identity) => {
            tracing::debug!("Authenticated {}", identity.subject);
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(
                "Unauthenticated request to {} {}",
                request.method(),
                request.uri().path()
            );
            Err(ApiError::unauthorized())
        }
    }
}
