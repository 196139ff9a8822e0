use super::models::SearchItem;
use crate::modules::catalog::domain::BookRecord;

/// Maps marketplace API items to book records
pub struct ApiMapper;

impl ApiMapper {
    /// Items without an ASIN or title are not usable catalog entries and are skipped
    pub fn map_item(item: SearchItem, fallback_category: Option<&str>) -> Option<BookRecord> {
        let asin = item.asin.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())?;
        let title = item
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())?;

        Some(BookRecord {
            asin,
            title,
            authors: item
                .authors
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            category: item
                .category
                .or_else(|| fallback_category.map(str::to_string)),
            price: item.price.as_ref().map(|p| p.amount),
            currency: item.price.and_then(|p| p.currency),
            rating: item.rating.filter(|r| (0.0..=5.0).contains(r)),
            review_count: item.review_count,
            url: item.detail_page_url,
            image_url: item.image_url,
        })
    }

    pub fn map_items(items: Vec<SearchItem>, fallback_category: Option<&str>) -> Vec<BookRecord> {
        let total = items.len();
        let records: Vec<BookRecord> = items
            .into_iter()
            .filter_map(|item| Self::map_item(item, fallback_category))
            .collect();

        if records.len() < total {
            log::debug!(
                "Marketplace API: skipped {} of {} items without asin/title",
                total - records.len(),
                total
            );
        }
        records
    }
}
