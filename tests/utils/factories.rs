/// Test data factories and fake collaborators
///
/// Provides convenient methods to create test data with sensible defaults
use async_trait::async_trait;
use shelfscout_lib::modules::catalog::{
    BookCollector, BookRecord, CollectionMethod, CollectionParameters, CollectorError,
    CollectorRegistry,
};
use shelfscout_lib::modules::jobs::TriggerCollection;
use shelfscout_lib::shared::{AppConfig, CollectionMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_TOKEN: &str = "test-token";

pub struct BookFactory {
    asin: String,
    title: String,
    category: Option<String>,
    price: Option<f64>,
}

impl BookFactory {
    pub fn new(index: usize) -> Self {
        Self {
            asin: format!("B{:09}", index),
            title: format!("Gardening Book {}", index),
            category: None,
            price: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn build(self) -> BookRecord {
        let mut record = BookRecord::new(self.asin, self.title);
        record.category = self.category;
        record.price = self.price;
        record
    }

    pub fn many(count: usize) -> Vec<BookRecord> {
        (1..=count).map(|i| Self::new(i).build()).collect()
    }
}

/// Fake collector returning a fixed outcome, optionally after a delay
pub struct StubCollector {
    outcome: Result<Vec<BookRecord>, CollectorError>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubCollector {
    pub fn returning(records: Vec<BookRecord>) -> Arc<Self> {
        Arc::new(Self::new(Ok(records)))
    }

    pub fn failing(error: CollectorError) -> Arc<Self> {
        Arc::new(Self::new(Err(error)))
    }

    pub fn slow(records: Vec<BookRecord>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::new(Ok(records))
        })
    }

    fn new(outcome: Result<Vec<BookRecord>, CollectorError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `collect` calls observed
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookCollector for StubCollector {
    async fn collect(
        &self,
        _query: &CollectionParameters,
    ) -> Result<Vec<BookRecord>, CollectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub fn registry(api: Arc<StubCollector>, scraping: Arc<StubCollector>) -> CollectorRegistry {
    CollectorRegistry::new(api, scraping)
}

pub fn test_config(mode: CollectionMode) -> AppConfig {
    AppConfig {
        auth_tokens: vec![TEST_TOKEN.to_string()],
        collection_mode: mode,
        worker_concurrency: 2,
        job_queue_capacity: 16,
        ..AppConfig::default()
    }
}

pub fn trigger(keywords: &str, method: CollectionMethod) -> TriggerCollection {
    TriggerCollection {
        keywords: keywords.to_string(),
        category: None,
        method,
        category_id: None,
    }
}
