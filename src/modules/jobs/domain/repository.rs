/// Repository trait for collection job persistence
///
/// The job store is the only shared mutable state of the job subsystem. Updates to
/// the same job are serialized by every implementation; updates to different jobs
/// never wait on each other beyond what the backing store imposes.
use crate::modules::jobs::domain::entities::{CollectionJob, JobPatch, NewCollectionJob};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Store a new pending job under a freshly allocated id
    async fn create(&self, job: NewCollectionJob) -> AppResult<CollectionJob>;

    /// Get job by ID
    async fn get_by_id(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>>;

    /// Get job by ID, `NotFound` when absent
    async fn get(&self, job_id: Uuid) -> AppResult<CollectionJob> {
        self.get_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))
    }

    /// Apply a state transition (see `CollectionJob::apply`).
    ///
    /// A transition to the status the job already has leaves the record unchanged
    /// and returns it as stored.
    async fn update(&self, job_id: Uuid, patch: JobPatch) -> AppResult<CollectionJob>;

    /// Atomically move a pending job to running.
    /// Returns None if the job is missing or no longer pending.
    async fn claim(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>>;

    /// Get all pending jobs, oldest first
    async fn get_pending_jobs(&self) -> AppResult<Vec<CollectionJob>>;

    /// Get job statistics
    async fn get_statistics(&self) -> AppResult<JobStatistics>;
}

/// Job store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStatistics {
    pub pending_count: i64,
    pub running_count: i64,
    pub completed_count: i64,
    pub failed_count: i64,
    pub total_count: i64,
}
