/// Job orchestration: create a job, run the selected collector, record the outcome
///
/// Collector failures are recorded in the job (`failed` plus `errorMessage`) and
/// are not errors of the orchestrator. Only failures of the job bookkeeping
/// itself are returned as `Err`.
use crate::modules::catalog::{BookRecord, CollectionMethod, CollectionParameters, CollectorRegistry};
use crate::modules::jobs::domain::entities::{CollectionJob, JobPatch, NewCollectionJob};
use crate::modules::jobs::domain::repository::JobRepository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_error, log_info, log_warn};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Terminal job plus the records produced by the run
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub job: CollectionJob,
    pub records: Vec<BookRecord>,
}

pub struct JobOrchestrator {
    jobs: Arc<dyn JobRepository>,
    collectors: CollectorRegistry,
}

impl JobOrchestrator {
    pub fn new(jobs: Arc<dyn JobRepository>, collectors: CollectorRegistry) -> Self {
        Self { jobs, collectors }
    }

    pub fn jobs(&self) -> &Arc<dyn JobRepository> {
        &self.jobs
    }

    /// Store a new pending job. Any store failure becomes `JobCreationError`.
    pub async fn create_job(
        &self,
        method: CollectionMethod,
        parameters: CollectionParameters,
        category_id: Option<String>,
    ) -> AppResult<CollectionJob> {
        let job = self
            .jobs
            .create(NewCollectionJob::new(method, parameters, category_id))
            .await
            .map_err(|e| match e {
                AppError::JobCreationError(_) => e,
                other => AppError::JobCreationError(other.to_string()),
            })?;

        log_info!(
            "Created {} collection job {} for '{}'",
            job.job_type,
            job.id,
            job.parameters.keywords
        );
        Ok(job)
    }

    /// Claim a pending job and run it to a terminal state.
    ///
    /// Returns `Ok(None)` when the job is missing or was already claimed, so a
    /// job handed to several runners executes once.
    pub async fn run_job(&self, job_id: Uuid) -> AppResult<Option<CollectionOutcome>> {
        let Some(job) = self.jobs.claim(job_id).await? else {
            log_warn!("Job {} is not pending, skipping", job_id);
            return Ok(None);
        };

        self.execute(job).await.map(Some)
    }

    /// Create a job and run it inline; the caller waits for the terminal state
    pub async fn collect_now(
        &self,
        method: CollectionMethod,
        parameters: CollectionParameters,
        category_id: Option<String>,
    ) -> AppResult<CollectionOutcome> {
        let job = self.create_job(method, parameters, category_id).await?;

        match self.run_job(job.id).await? {
            Some(outcome) => Ok(outcome),
            // Claimed by another runner meanwhile; report whatever is stored
            None => Ok(CollectionOutcome {
                job: self.jobs.get(job.id).await?,
                records: Vec::new(),
            }),
        }
    }

    async fn execute(&self, job: CollectionJob) -> AppResult<CollectionOutcome> {
        let collector = self.collectors.collector_for(job.job_type);
        let method = job.job_type.as_str();

        LogContext::collection_result(&job.parameters.keywords, method, None);
        let timer = TimedOperation::new(&format!("collection job {}", job.id));

        let result = collector.collect(&job.parameters).await;
        let (patch, records) = match result {
            Ok(records) => {
                LogContext::collection_result(&job.parameters.keywords, method, Some(records.len()));
                let count = u32::try_from(records.len()).unwrap_or(u32::MAX);
                (JobPatch::completed(count, Utc::now()), records)
            }
            Err(e) => {
                log_warn!("Collection job {} failed: {}", job.id, e);
                (JobPatch::failed(e.to_string(), Utc::now()), Vec::new())
            }
        };

        let job = self.jobs.update(job.id, patch).await.map_err(|e| {
            log_error!("Failed to record outcome of job {}: {}", job.id, e);
            e
        })?;
        timer.finish_with_info(job.status.as_str());

        Ok(CollectionOutcome { job, records })
    }
}
