/// In-process implementation of JobRepository
///
/// Backed by a `DashMap`. Every mutation of a job happens while holding that
/// entry's write guard, so concurrent updates of the same job apply one after
/// the other and each sees the result of the previous one.
use crate::modules::jobs::domain::entities::{
    CollectionJob, JobPatch, JobStatus, NewCollectionJob,
};
use crate::modules::jobs::domain::repository::{JobRepository, JobStatistics};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: DashMap<Uuid, CollectionJob>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: NewCollectionJob) -> AppResult<CollectionJob> {
        let mut candidate = CollectionJob::pending(job, Utc::now());

        // never overwrite a stored job on a v4 collision
        for _ in 0..3 {
            match self.jobs.entry(candidate.id) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate.clone());
                    return Ok(candidate);
                }
                Entry::Occupied(_) => {
                    candidate.id = Uuid::new_v4();
                }
            }
        }

        Err(AppError::JobCreationError(
            "could not allocate a unique job id".to_string(),
        ))
    }

    async fn get_by_id(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>> {
        Ok(self.jobs.get(&job_id).map(|job| job.value().clone()))
    }

    async fn update(&self, job_id: Uuid, patch: JobPatch) -> AppResult<CollectionJob> {
        let mut entry = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

        let current = entry.value().clone();
        match current.apply(&patch)? {
            Some(next) => {
                LogContext::job_transition(&job_id, current.status.as_str(), next.status.as_str());
                *entry.value_mut() = next.clone();
                Ok(next)
            }
            None => Ok(current),
        }
    }

    async fn claim(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>> {
        let Some(mut entry) = self.jobs.get_mut(&job_id) else {
            return Ok(None);
        };

        if entry.status != JobStatus::Pending {
            return Ok(None);
        }

        let next = entry.apply(&JobPatch::running(Utc::now()))?;
        if let Some(next) = &next {
            LogContext::job_transition(&job_id, JobStatus::Pending.as_str(), next.status.as_str());
            *entry.value_mut() = next.clone();
        }
        Ok(next)
    }

    async fn get_pending_jobs(&self) -> AppResult<Vec<CollectionJob>> {
        let mut pending: Vec<CollectionJob> = self
            .jobs
            .iter()
            .filter(|job| job.status == JobStatus::Pending)
            .map(|job| job.value().clone())
            .collect();
        pending.sort_by_key(|job| job.created_at);
        Ok(pending)
    }

    async fn get_statistics(&self) -> AppResult<JobStatistics> {
        let mut stats = JobStatistics::default();
        for job in self.jobs.iter() {
            match job.status {
                JobStatus::Pending => stats.pending_count += 1,
                JobStatus::Running => stats.running_count += 1,
                JobStatus::Completed => stats.completed_count += 1,
                JobStatus::Failed => stats.failed_count += 1,
            }
            stats.total_count += 1;
        }
        Ok(stats)
    }
}
