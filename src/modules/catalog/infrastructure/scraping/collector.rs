use super::parser::ResultPageParser;
use crate::modules::catalog::domain::{
    BookCollector, BookRecord, CollectionParameters, CollectorError,
};
use crate::modules::catalog::infrastructure::http_client::RateLimitClient;
use crate::shared::config::AppConfig;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Fetches and parses marketplace search result pages
pub struct ScrapeCollector {
    http_client: RateLimitClient,
    parser: ResultPageParser,
    base_url: String,
    max_pages: u32,
}

impl ScrapeCollector {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(
            RateLimitClient::for_marketplace_pages(config.scrape_requests_per_second),
            &config.marketplace_scrape_base_url,
            config.max_pages,
        )
    }

    /// Create collector with custom HTTP client (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: &str, max_pages: u32) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http_client,
            parser: ResultPageParser::new(&base_url),
            base_url,
            max_pages: max_pages.max(1),
        }
    }

    fn page_url(&self, query: &CollectionParameters, page: u32) -> String {
        let mut url = format!(
            "{}/s?k={}",
            self.base_url,
            urlencoding::encode(query.search_keywords())
        );
        if let Some(category) = query.search_category() {
            url.push_str(&format!("&i={}", urlencoding::encode(category)));
        }
        url.push_str(&format!("&page={}", page));
        url
    }

    async fn fetch_page(
        &self,
        query: &CollectionParameters,
        page: u32,
    ) -> Result<String, CollectorError> {
        let url = self.page_url(query, page);
        let response = self.http_client.get(&url).await?;
        let status = response.status();

        match status {
            s if s.is_success() => self.http_client.read_text(response).await,
            // The marketplace answers automated traffic with 403/503 block pages
            StatusCode::FORBIDDEN | StatusCode::SERVICE_UNAVAILABLE => {
                Err(CollectorError::rate_limited(format!(
                    "marketplace blocked automated access (HTTP {})",
                    status
                )))
            }
            _ => Err(CollectorError::Upstream(format!(
                "Marketplace page returned HTTP {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl BookCollector for ScrapeCollector {
    async fn collect(
        &self,
        query: &CollectionParameters,
    ) -> Result<Vec<BookRecord>, CollectorError> {
        log::info!(
            "Marketplace pages: scraping '{}' (category: {:?}, max pages: {})",
            query.keywords,
            query.category,
            self.max_pages
        );

        let mut records = Vec::new();
        for page in 1..=self.max_pages {
            let html = self.fetch_page(query, page).await?;
            let parsed = self.parser.parse(&html, query.search_category())?;

            log::debug!(
                "Marketplace pages: page {} yielded {} books",
                page,
                parsed.records.len()
            );

            let done = parsed.records.is_empty() || !parsed.has_next_page;
            records.extend(parsed.records);
            if done {
                break;
            }
        }

        let records = BookRecord::dedupe(records);
        log::info!(
            "Marketplace pages: found {} books for '{}'",
            records.len(),
            query.keywords
        );
        Ok(records)
    }
}
