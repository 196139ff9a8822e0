/// Read-only job status lookups for polling clients
use crate::modules::jobs::domain::entities::JobView;
use crate::modules::jobs::domain::repository::JobRepository;
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;
use uuid::Uuid;

pub struct JobStatusService {
    jobs: Arc<dyn JobRepository>,
}

impl JobStatusService {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    /// Resolve a caller-supplied job id.
    ///
    /// A malformed id is `InvalidId`; a well-formed id with no stored job is
    /// `NotFound`.
    pub async fn query(&self, raw_id: &str) -> AppResult<JobView> {
        let job_id = Self::parse_job_id(raw_id)?;
        let job = self.jobs.get(job_id).await?;
        Ok(JobView::from(job))
    }

    pub fn parse_job_id(raw_id: &str) -> AppResult<Uuid> {
        let trimmed = raw_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidId("jobId is empty".to_string()));
        }
        Uuid::parse_str(trimmed).map_err(|e| AppError::InvalidId(format!("'{}': {}", trimmed, e)))
    }
}
