pub mod api;
pub mod http_client;
pub mod scraping;

pub use api::ApiCollector;
pub use http_client::{RateLimitClient, RetryPolicy};
pub use scraping::ScrapeCollector;
