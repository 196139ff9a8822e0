use super::mapper::ApiMapper;
use super::models::{ErrorResponse, SearchResponse};
use crate::modules::catalog::domain::{
    BookCollector, BookRecord, CollectionParameters, CollectorError,
};
use crate::modules::catalog::infrastructure::http_client::RateLimitClient;
use crate::shared::config::AppConfig;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Structured lookups against the marketplace data API
pub struct ApiCollector {
    http_client: RateLimitClient,
    base_url: String,
    max_pages: u32,
}

impl ApiCollector {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(
            RateLimitClient::for_marketplace_api(
                config.api_requests_per_second,
                config.marketplace_api_key.as_deref(),
            ),
            &config.marketplace_api_base_url,
            config.max_pages,
        )
    }

    /// Create collector with custom HTTP client (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: &str, max_pages: u32) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: max_pages.max(1),
        }
    }

    fn search_url(&self, query: &CollectionParameters, page: u32) -> String {
        let mut url = format!(
            "{}/search?keywords={}&page={}",
            self.base_url,
            urlencoding::encode(query.search_keywords()),
            page
        );
        if let Some(category) = query.search_category() {
            url.push_str(&format!("&category={}", urlencoding::encode(category)));
        }
        url
    }

    async fn fetch_page(
        &self,
        query: &CollectionParameters,
        page: u32,
    ) -> Result<SearchResponse, CollectorError> {
        let url = self.search_url(query, page);
        let response = self.http_client.get(&url).await?;
        let status = response.status();

        if status.is_success() {
            return self.http_client.parse_json(response).await;
        }

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = self.http_client.read_text(response).await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|e| match e.error.code {
                        Some(code) => format!("{} ({})", e.error.message, code),
                        None => e.error.message,
                    })
                    .unwrap_or_else(|_| format!("marketplace rejected the query (HTTP {})", status));
                Err(CollectorError::InvalidQuery(message))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(CollectorError::rate_limited(
                "Marketplace API throttled the request",
            )),
            _ => Err(CollectorError::Upstream(format!(
                "Marketplace API returned HTTP {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl BookCollector for ApiCollector {
    async fn collect(
        &self,
        query: &CollectionParameters,
    ) -> Result<Vec<BookRecord>, CollectorError> {
        log::info!(
            "Marketplace API: searching '{}' (category: {:?}, max pages: {})",
            query.keywords,
            query.category,
            self.max_pages
        );

        let mut records = Vec::new();
        for page in 1..=self.max_pages {
            let response = self.fetch_page(query, page).await?;
            let has_more = response.has_more_after(page);
            let page_records = ApiMapper::map_items(response.items, query.search_category());

            log::debug!(
                "Marketplace API: page {} returned {} books",
                page,
                page_records.len()
            );

            if page_records.is_empty() {
                break;
            }
            records.extend(page_records);

            if !has_more {
                break;
            }
        }

        let records = BookRecord::dedupe(records);
        log::info!(
            "Marketplace API: found {} books for '{}'",
            records.len(),
            query.keywords
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::infrastructure::http_client::RetryPolicy;

    fn collector() -> ApiCollector {
        ApiCollector::with_client(
            RateLimitClient::new(
                "Marketplace API",
                RetryPolicy::none(),
                RateLimitClient::create_rate_limiter(100.0, 10),
                "test".to_string(),
            ),
            "http://localhost:9/v1/",
            2,
        )
    }

    #[test]
    fn test_search_url_encodes_query() {
        let query = CollectionParameters::new("home & garden", Some("Crafts Hobbies".into()));
        assert_eq!(
            collector().search_url(&query, 2),
            "http://localhost:9/v1/search?keywords=home%20%26%20garden&page=2&category=Crafts%20Hobbies"
        );

        let query = CollectionParameters::new(" gardening  ", Some(" Garden ".into()));
        assert_eq!(
            collector().search_url(&query, 1),
            "http://localhost:9/v1/search?keywords=gardening&page=1&category=Garden"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_upstream_error() {
        let query = CollectionParameters::new("gardening", None);
        let result = collector().collect(&query).await;
        assert!(matches!(result, Err(CollectorError::Upstream(_))));
    }
}
