pub mod collector;
pub mod entities;
pub mod value_objects;

pub use collector::{BookCollector, CollectorError};
pub use entities::{BookRecord, CollectionParameters};
pub use value_objects::CollectionMethod;
