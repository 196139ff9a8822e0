/// Wire types of the marketplace data API search endpoint
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl SearchResponse {
    /// Whether the upstream reports more pages after `page`
    pub fn has_more_after(&self, page: u32) -> bool {
        match self.total_pages {
            Some(total) => page < total,
            None => !self.items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub asin: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub detail_page_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: Option<String>,
}

/// Body returned with 4xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: String,
}
