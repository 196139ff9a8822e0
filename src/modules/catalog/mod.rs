/// Book catalog acquisition
///
/// Two interchangeable collection strategies turn a (keywords, category) query into
/// book records:
/// - `ApiCollector`: structured lookups against the marketplace data API
/// - `ScrapeCollector`: fetching and parsing marketplace result pages
///
/// Both implement `BookCollector`; `CollectorRegistry` picks one per `CollectionMethod`.
pub mod domain;
pub mod infrastructure;
pub mod registry;

pub use domain::{
    collector::{BookCollector, CollectorError},
    entities::{BookRecord, CollectionParameters},
    value_objects::CollectionMethod,
};
pub use infrastructure::{ApiCollector, ScrapeCollector};
pub use registry::CollectorRegistry;
