use crate::modules::catalog::{BookRecord, CollectionMethod, CollectionParameters};
use crate::modules::jobs::domain::entities::{CollectionJob, JobStatus};
use crate::modules::jobs::orchestrator::JobOrchestrator;
use crate::modules::jobs::worker::JobQueue;
use crate::shared::config::CollectionMode;
use crate::shared::errors::AppResult;
use crate::shared::utils::Validator;
use crate::{log_error, log_warn};
use std::sync::Arc;

/// A validated-on-entry request to collect catalog data
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerCollection {
    pub keywords: String,
    pub category: Option<String>,
    pub method: CollectionMethod,
    pub category_id: Option<String>,
}

/// What the trigger endpoint reports back
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    pub success: bool,
    pub job: CollectionJob,
    pub books_collected: u32,
    pub records: Vec<BookRecord>,
    pub message: String,
}

pub struct CollectionService {
    orchestrator: Arc<JobOrchestrator>,
    queue: JobQueue,
    mode: CollectionMode,
}

impl CollectionService {
    pub fn new(orchestrator: Arc<JobOrchestrator>, queue: JobQueue, mode: CollectionMode) -> Self {
        Self {
            orchestrator,
            queue,
            mode,
        }
    }

    pub fn mode(&self) -> CollectionMode {
        self.mode
    }

    /// Validate the request, create the job and either queue it or run it inline.
    ///
    /// Nothing is stored when validation fails.
    pub async fn trigger(&self, request: TriggerCollection) -> AppResult<TriggerOutcome> {
        Validator::validate_keywords(&request.keywords)?;
        Validator::validate_category("category", request.category.as_deref())?;
        Validator::validate_category("categoryId", request.category_id.as_deref())?;

        let parameters = CollectionParameters::new(request.keywords, request.category);

        match self.mode {
            CollectionMode::Async => {
                let job = self
                    .orchestrator
                    .create_job(request.method, parameters, request.category_id)
                    .await?;
                self.hand_off(&job);

                Ok(TriggerOutcome {
                    success: true,
                    books_collected: 0,
                    records: Vec::new(),
                    message: "Collection job queued".to_string(),
                    job,
                })
            }
            CollectionMode::Sync => {
                let outcome = self
                    .orchestrator
                    .collect_now(request.method, parameters, request.category_id)
                    .await?;

                let success = outcome.job.status == JobStatus::Completed;
                let message = if success {
                    format!("Successfully collected {} books", outcome.job.books_collected)
                } else {
                    format!(
                        "Collection failed: {}",
                        outcome.job.error_message.as_deref().unwrap_or("unknown error")
                    )
                };

                Ok(TriggerOutcome {
                    success,
                    books_collected: outcome.job.books_collected,
                    records: outcome.records,
                    message,
                    job: outcome.job,
                })
            }
        }
    }

    /// Give the job to the worker without waiting; run it on a detached task when
    /// the queue is full or the worker is gone
    fn hand_off(&self, job: &CollectionJob) {
        let Err(e) = self.queue.try_enqueue(job.id) else {
            return;
        };

        log_warn!("{}, running job {} on a detached task", e, job.id);
        let orchestrator = Arc::clone(&self.orchestrator);
        let job_id = job.id;
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run_job(job_id).await {
                log_error!("Detached run of job {} failed: {}", job_id, e);
            }
        });
    }
}
