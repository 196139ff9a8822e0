use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The original collection query, stored verbatim on the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionParameters {
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CollectionParameters {
    pub fn new(keywords: impl Into<String>, category: Option<String>) -> Self {
        Self {
            keywords: keywords.into(),
            category,
        }
    }

    /// Keywords as sent upstream
    pub fn search_keywords(&self) -> &str {
        self.keywords.trim()
    }

    /// Category as sent upstream; a blank category means none
    pub fn search_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A single acquired catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Marketplace identifier (ASIN)
    pub asin: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl BookRecord {
    pub fn new(asin: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            title: title.into(),
            authors: Vec::new(),
            category: None,
            price: None,
            currency: None,
            rating: None,
            review_count: None,
            url: None,
            image_url: None,
        }
    }

    /// Drop repeated ASINs (the same book often appears on several pages), keeping first-seen order
    pub fn dedupe(records: Vec<BookRecord>) -> Vec<BookRecord> {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|record| seen.insert(record.asin.clone()))
            .collect()
    }
}
