/// Background worker for collection jobs
///
/// The trigger endpoint stores a pending job and hands its id to the `JobQueue`;
/// the worker receives ids and runs each job through the orchestrator on its own
/// task, with at most `concurrency` jobs in flight. On start it also picks up jobs
/// still pending in the store, e.g. left over from a previous process.
use crate::modules::jobs::orchestrator::JobOrchestrator;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_error, log_info, log_warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Sending half of the job handoff channel
#[derive(Clone, Debug)]
pub struct JobQueue {
    sender: mpsc::Sender<Uuid>,
}

impl JobQueue {
    /// Bounded queue; `enqueue` waits while the queue is full, `try_enqueue` does not
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Uuid>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub async fn enqueue(&self, job_id: Uuid) -> AppResult<()> {
        self.sender
            .send(job_id)
            .await
            .map_err(|_| AppError::InternalError("job queue is closed".to_string()))
    }

    /// Hand over without waiting; fails when the queue is full or closed
    pub fn try_enqueue(&self, job_id: Uuid) -> AppResult<()> {
        self.sender.try_send(job_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                AppError::InternalError("job queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::InternalError("job queue is closed".to_string())
            }
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Background worker that processes queued collection jobs
pub struct BackgroundWorker {
    orchestrator: Arc<JobOrchestrator>,
    receiver: Mutex<Option<mpsc::Receiver<Uuid>>>,
    concurrency: usize,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
    is_running: AtomicBool,
    processed: Arc<AtomicU64>,
}

impl BackgroundWorker {
    pub fn new(
        orchestrator: Arc<JobOrchestrator>,
        receiver: mpsc::Receiver<Uuid>,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            orchestrator,
            receiver: Mutex::new(Some(receiver)),
            concurrency,
            permits: Arc::new(Semaphore::new(concurrency)),
            shutdown: CancellationToken::new(),
            is_running: AtomicBool::new(false),
            processed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the worker loop until `stop` is called or every `JobQueue` is dropped.
    ///
    /// Call it with tokio::spawn. Jobs already in flight are awaited before it
    /// returns.
    pub async fn run(self: Arc<Self>) {
        let Some(mut receiver) = self.receiver.lock().await.take() else {
            log_warn!("Background worker is already running");
            return;
        };

        self.is_running.store(true, Ordering::SeqCst);
        log_info!("Background worker started (concurrency: {})", self.concurrency);

        if let Err(e) = self.recover_pending().await {
            log_error!("Failed to recover pending jobs: {}", e);
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    log_info!("Background worker stop requested");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(job_id) => self.dispatch(job_id).await,
                    None => {
                        log_info!("Job queue closed");
                        break;
                    }
                },
            }
        }

        // Wait for in-flight jobs; a running job always reaches a terminal state
        let all_permits = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        if let Ok(permits) = self.permits.acquire_many(all_permits).await {
            drop(permits);
        }

        self.is_running.store(false, Ordering::SeqCst);
        log_info!("Background worker stopped");
    }

    /// Stop accepting new jobs
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    async fn recover_pending(&self) -> AppResult<()> {
        let pending = self.orchestrator.jobs().get_pending_jobs().await?;
        if !pending.is_empty() {
            log_info!("Recovering {} pending collection jobs", pending.len());
        }
        for job in pending {
            self.dispatch(job.id).await;
        }
        Ok(())
    }

    async fn dispatch(&self, job_id: Uuid) {
        let permit = tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
            _ = self.shutdown.cancelled() => {
                log_warn!("Job {} left pending by shutdown", job_id);
                return;
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let processed = Arc::clone(&self.processed);
        tokio::spawn(async move {
            let _permit = permit;
            match orchestrator.run_job(job_id).await {
                Ok(Some(outcome)) => {
                    processed.fetch_add(1, Ordering::Relaxed);
                    log_info!(
                        "Job {} finished as {} ({} books)",
                        job_id,
                        outcome.job.status,
                        outcome.job.books_collected
                    );
                }
                Ok(None) => log_debug!("Job {} was already handled", job_id),
                Err(e) => log_error!("Job {} could not be processed: {}", job_id, e),
            }
        });
    }

    /// Get statistics about the worker and job store
    pub async fn get_statistics(&self) -> AppResult<WorkerStatistics> {
        let job_stats = self.orchestrator.jobs().get_statistics().await?;

        Ok(WorkerStatistics {
            is_running: self.is_running(),
            in_flight: self.concurrency - self.permits.available_permits().min(self.concurrency),
            processed_jobs: self.processed.load(Ordering::Relaxed),
            pending_jobs: job_stats.pending_count,
            running_jobs: job_stats.running_count,
            completed_jobs: job_stats.completed_count,
            failed_jobs: job_stats.failed_count,
            total_jobs: job_stats.total_count,
        })
    }
}

/// Worker statistics for monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatistics {
    pub is_running: bool,
    pub in_flight: usize,
    pub processed_jobs: u64,
    pub pending_jobs: i64,
    pub running_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    pub total_jobs: i64,
}
