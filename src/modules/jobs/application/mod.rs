pub mod service;

pub use service::{CollectionService, TriggerCollection, TriggerOutcome};
