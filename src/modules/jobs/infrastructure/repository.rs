/// Diesel-based implementation of JobRepository
///
/// Same-job updates are serialized with `SELECT ... FOR UPDATE` inside a
/// transaction; claiming is a single conditional UPDATE so only one worker can
/// move a given job out of pending.
use crate::modules::jobs::domain::entities::{
    CollectionJob, JobPatch, JobStatus, NewCollectionJob,
};
use crate::modules::jobs::domain::repository::{JobRepository, JobStatistics};
use crate::modules::jobs::infrastructure::models::{
    CollectionJobChangeset, CollectionJobModel, NewCollectionJobRow,
};
use crate::schema::collection_jobs;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::database::{DbConnection, DbPool};
use crate::shared::utils::logger::LogContext;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

pub struct JobRepositoryImpl {
    pool: DbPool,
}

impl JobRepositoryImpl {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a blocking Diesel operation on the blocking thread pool
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DbConnection) -> AppResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                AppError::DatabaseError(format!("Failed to get connection: {}", e))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::InternalError(format!("{} task panicked: {}", operation, e)))?
    }
}

fn db_error(context: &'static str) -> impl Fn(diesel::result::Error) -> AppError {
    move |e| AppError::DatabaseError(format!("{}: {}", context, e))
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: NewCollectionJob) -> AppResult<CollectionJob> {
        let job = CollectionJob::pending(job, Utc::now());
        let row = NewCollectionJobRow::from_job(&job)
            .map_err(|e| AppError::JobCreationError(e.to_string()))?;

        self.with_conn("create job", move |conn| {
            diesel::insert_into(collection_jobs::table)
                .values(&row)
                .returning(CollectionJobModel::as_returning())
                .get_result(conn)
                .map_err(|e| AppError::JobCreationError(format!("Failed to insert job: {}", e)))?
                .into_job()
        })
        .await
    }

    async fn get_by_id(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>> {
        self.with_conn("get job", move |conn| {
            collection_jobs::table
                .find(job_id)
                .select(CollectionJobModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to get job by id"))?
                .map(CollectionJobModel::into_job)
                .transpose()
        })
        .await
    }

    async fn update(&self, job_id: Uuid, patch: JobPatch) -> AppResult<CollectionJob> {
        self.with_conn("update job", move |conn| {
            conn.transaction::<CollectionJob, AppError, _>(|conn| {
                let current = collection_jobs::table
                    .find(job_id)
                    .select(CollectionJobModel::as_select())
                    .for_update()
                    .first(conn)
                    .optional()
                    .map_err(db_error("Failed to lock job"))?
                    .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?
                    .into_job()?;

                let Some(next) = current.apply(&patch)? else {
                    return Ok(current);
                };

                let updated = diesel::update(collection_jobs::table.find(job_id))
                    .set(CollectionJobChangeset::from(&next))
                    .returning(CollectionJobModel::as_returning())
                    .get_result(conn)
                    .map_err(db_error("Failed to update job"))?
                    .into_job()?;

                LogContext::job_transition(&job_id, current.status.as_str(), updated.status.as_str());
                Ok(updated)
            })
        })
        .await
    }

    async fn claim(&self, job_id: Uuid) -> AppResult<Option<CollectionJob>> {
        let started_at = Utc::now();

        let claimed = self
            .with_conn("claim job", move |conn| {
                diesel::update(
                    collection_jobs::table
                        .filter(collection_jobs::id.eq(job_id))
                        .filter(collection_jobs::status.eq(JobStatus::Pending.as_str())),
                )
                .set((
                    collection_jobs::status.eq(JobStatus::Running.as_str()),
                    collection_jobs::started_at.eq(Some(started_at)),
                ))
                .returning(CollectionJobModel::as_returning())
                .get_result(conn)
                .optional()
                .map_err(db_error("Failed to claim job"))?
                .map(CollectionJobModel::into_job)
                .transpose()
            })
            .await?;

        if claimed.is_some() {
            LogContext::job_transition(&job_id, JobStatus::Pending.as_str(), JobStatus::Running.as_str());
        }
        Ok(claimed)
    }

    async fn get_pending_jobs(&self) -> AppResult<Vec<CollectionJob>> {
        self.with_conn("get pending jobs", |conn| {
            collection_jobs::table
                .filter(collection_jobs::status.eq(JobStatus::Pending.as_str()))
                .order(collection_jobs::created_at.asc())
                .select(CollectionJobModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to get pending jobs"))?
                .into_iter()
                .map(CollectionJobModel::into_job)
                .collect()
        })
        .await
    }

    async fn get_statistics(&self) -> AppResult<JobStatistics> {
        let counts: Vec<(String, i64)> = self
            .with_conn("job statistics", |conn| {
                collection_jobs::table
                    .group_by(collection_jobs::status)
                    .select((collection_jobs::status, diesel::dsl::count_star()))
                    .load(conn)
                    .map_err(db_error("Failed to count jobs"))
            })
            .await?;

        let mut stats = JobStatistics::default();
        for (status, count) in counts {
            match status.parse::<JobStatus>() {
                Ok(JobStatus::Pending) => stats.pending_count = count,
                Ok(JobStatus::Running) => stats.running_count = count,
                Ok(JobStatus::Completed) => stats.completed_count = count,
                Ok(JobStatus::Failed) => stats.failed_count = count,
                Err(e) => log::warn!("Ignoring jobs with unknown status: {}", e),
            }
            stats.total_count += count;
        }
        Ok(stats)
    }
}
