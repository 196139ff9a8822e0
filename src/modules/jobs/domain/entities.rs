/// Domain entities for collection jobs
///
/// A collection job is the audit trail of one catalog acquisition request. Its
/// status only moves forward: pending -> running -> completed | failed.
use crate::modules::catalog::domain::{CollectionMethod, CollectionParameters};
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job status, stored as its lowercase name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `next` is the single forward step from this status
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// New job to be stored (before an id is allocated)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCollectionJob {
    pub job_type: CollectionMethod,
    pub parameters: CollectionParameters,
    pub category_id: Option<String>,
}

impl NewCollectionJob {
    pub fn new(
        job_type: CollectionMethod,
        parameters: CollectionParameters,
        category_id: Option<String>,
    ) -> Self {
        Self {
            job_type,
            parameters,
            category_id,
        }
    }
}

/// Stored collection job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionJob {
    pub id: Uuid,
    pub job_type: CollectionMethod,
    pub status: JobStatus,
    pub category_id: Option<String>,
    pub parameters: CollectionParameters,
    pub books_collected: u32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CollectionJob {
    /// Fresh pending job with a newly allocated id
    pub fn pending(new_job: NewCollectionJob, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: new_job.job_type,
            status: JobStatus::Pending,
            category_id: new_job.category_id,
            parameters: new_job.parameters,
            books_collected: 0,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at,
        }
    }

    /// Apply a state transition.
    ///
    /// Returns `Ok(None)` when the job is already in the requested status, so
    /// duplicate transitions are no-ops. Backward or skipping moves, a
    /// `completed_at` on a non-terminal status and an error message on anything
    /// but `failed` are rejected with `InvalidTransition`.
    pub fn apply(&self, patch: &JobPatch) -> AppResult<Option<CollectionJob>> {
        if patch.status == self.status {
            return Ok(None);
        }

        let rejected = || AppError::InvalidTransition {
            from: self.status.to_string(),
            to: patch.status.to_string(),
        };

        if !self.status.can_transition_to(patch.status)
            || (patch.completed_at.is_some() && !patch.status.is_terminal())
            || (patch.error_message.is_some() && patch.status != JobStatus::Failed)
        {
            return Err(rejected());
        }

        let now = Utc::now();
        let mut next = self.clone();
        next.status = patch.status;

        match patch.status {
            JobStatus::Running => {
                next.started_at = Some(patch.started_at.unwrap_or(now).max(self.created_at));
            }
            JobStatus::Completed | JobStatus::Failed => {
                let started_at = self.started_at.unwrap_or(self.created_at);
                next.completed_at = Some(patch.completed_at.unwrap_or(now).max(started_at));

                if patch.status == JobStatus::Completed {
                    next.books_collected = patch.books_collected.unwrap_or(0);
                    next.error_message = None;
                } else {
                    next.error_message = Some(
                        patch
                            .error_message
                            .clone()
                            .unwrap_or_else(|| "Collection failed".to_string()),
                    );
                }
            }
            JobStatus::Pending => return Err(rejected()),
        }

        Ok(Some(next))
    }
}

/// A requested state transition plus the fields that come with it
#[derive(Debug, Clone, PartialEq)]
pub struct JobPatch {
    pub status: JobStatus,
    pub books_collected: Option<u32>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn running(at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Running,
            books_collected: None,
            error_message: None,
            started_at: Some(at),
            completed_at: None,
        }
    }

    pub fn completed(books_collected: u32, at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Completed,
            books_collected: Some(books_collected),
            error_message: None,
            started_at: None,
            completed_at: Some(at),
        }
    }

    pub fn failed(error_message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Failed,
            books_collected: None,
            error_message: Some(error_message.into()),
            started_at: None,
            completed_at: Some(at),
        }
    }
}

/// Public, stable shape of a job as returned by the HTTP endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: Uuid,
    pub job_type: CollectionMethod,
    pub status: JobStatus,
    pub category_id: Option<String>,
    pub parameters: CollectionParameters,
    pub books_collected: u32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CollectionJob> for JobView {
    fn from(job: CollectionJob) -> Self {
        Self {
            id: job.id,
            job_type: job.job_type,
            status: job.status,
            category_id: job.category_id,
            parameters: job.parameters,
            books_collected: job.books_collected,
            error_message: job.error_message,
            started_at: job.started_at,
            completed_at: job.completed_at,
            created_at: job.created_at,
        }
    }
}
