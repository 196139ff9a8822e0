/// Diesel models for the collection_jobs table
use crate::modules::catalog::domain::CollectionParameters;
use crate::modules::jobs::domain::entities::CollectionJob;
use crate::schema::collection_jobs;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Diesel model for inserting new jobs
#[derive(Insertable, Debug)]
#[diesel(table_name = collection_jobs)]
pub struct NewCollectionJobRow {
    pub id: Uuid,
    pub job_type: String,
    pub status: String,
    pub category_id: Option<String>,
    pub parameters: JsonValue,
    pub books_collected: i32,
    pub created_at: DateTime<Utc>,
}

impl NewCollectionJobRow {
    pub fn from_job(job: &CollectionJob) -> AppResult<Self> {
        Ok(Self {
            id: job.id,
            job_type: job.job_type.to_string(),
            status: job.status.to_string(),
            category_id: job.category_id.clone(),
            parameters: serde_json::to_value(&job.parameters)
                .map_err(|e| AppError::JobCreationError(format!("unserializable parameters: {}", e)))?,
            books_collected: clamp_count(job.books_collected),
            created_at: job.created_at,
        })
    }
}

/// Diesel model for querying existing jobs
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = collection_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CollectionJobModel {
    pub id: Uuid,
    pub job_type: String,
    pub status: String,
    pub category_id: Option<String>,
    pub parameters: JsonValue,
    pub books_collected: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CollectionJobModel {
    /// Convert to domain CollectionJob
    pub fn into_job(self) -> AppResult<CollectionJob> {
        let parameters: CollectionParameters = serde_json::from_value(self.parameters)
            .map_err(|e| AppError::DatabaseError(format!("job {} has malformed parameters: {}", self.id, e)))?;

        Ok(CollectionJob {
            id: self.id,
            job_type: self.job_type.parse().map_err(AppError::DatabaseError)?,
            status: self.status.parse().map_err(AppError::DatabaseError)?,
            category_id: self.category_id,
            parameters,
            books_collected: u32::try_from(self.books_collected).unwrap_or(0),
            error_message: self.error_message,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
        })
    }
}

/// Mutable columns written by a state transition
#[derive(AsChangeset, Debug)]
#[diesel(table_name = collection_jobs)]
#[diesel(treat_none_as_null = true)]
pub struct CollectionJobChangeset {
    pub status: String,
    pub books_collected: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&CollectionJob> for CollectionJobChangeset {
    fn from(job: &CollectionJob) -> Self {
        Self {
            status: job.status.to_string(),
            books_collected: clamp_count(job.books_collected),
            error_message: job.error_message.clone(),
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

fn clamp_count(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
