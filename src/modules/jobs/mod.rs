/// Collection job subsystem
///
/// Tracks each catalog collection request as a job moving through
/// pending -> running -> completed | failed, so clients can poll for the outcome.
///
/// Architecture:
/// - Domain: job entity, transition rules and repository trait
/// - Infrastructure: in-memory store and Diesel/PostgreSQL store
/// - Orchestrator: runs a job through the selected collector
/// - Worker: executes queued jobs in the background
/// - Status: read-only lookups for polling
/// - Application + commands: the HTTP-facing use cases
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod orchestrator;
pub mod status;
pub mod worker;

// Re-exports for easy access
pub use application::{CollectionService, TriggerCollection, TriggerOutcome};
pub use domain::{
    entities::{CollectionJob, JobPatch, JobStatus, JobView, NewCollectionJob},
    repository::{JobRepository, JobStatistics},
};
pub use infrastructure::InMemoryJobRepository;
#[cfg(feature = "postgres")]
pub use infrastructure::JobRepositoryImpl;
pub use orchestrator::{CollectionOutcome, JobOrchestrator};
pub use status::JobStatusService;
pub use worker::{BackgroundWorker, JobQueue, WorkerStatistics};
