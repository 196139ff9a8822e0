use super::domain::{BookCollector, CollectionMethod};
use super::infrastructure::{ApiCollector, ScrapeCollector};
use crate::shared::config::AppConfig;
use std::sync::Arc;

/// The closed set of collection strategies, one per `CollectionMethod`
#[derive(Clone)]
pub struct CollectorRegistry {
    api: Arc<dyn BookCollector>,
    scraping: Arc<dyn BookCollector>,
}

impl CollectorRegistry {
    pub fn new(api: Arc<dyn BookCollector>, scraping: Arc<dyn BookCollector>) -> Self {
        Self { api, scraping }
    }

    /// Production collectors against the configured marketplace endpoints
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(ApiCollector::new(config)),
            Arc::new(ScrapeCollector::new(config)),
        )
    }

    pub fn collector_for(&self, method: CollectionMethod) -> Arc<dyn BookCollector> {
        match method {
            CollectionMethod::Api => Arc::clone(&self.api),
            CollectionMethod::Scraping => Arc::clone(&self.scraping),
        }
    }
}
