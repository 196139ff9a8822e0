pub mod entities;
pub mod repository;

pub use entities::{CollectionJob, JobPatch, JobStatus, JobView, NewCollectionJob};
pub use repository::{JobRepository, JobStatistics};
