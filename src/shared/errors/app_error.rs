use serde::Serialize;
use thiserror::Error;

/// Errors of the job subsystem. Collector failures are not in here: they end up
/// in a failed job's `errorMessage`.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Failed to create collection job: {0}")]
    JobCreationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid job id: {0}")]
    InvalidId(String),

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for failures of the job bookkeeping itself rather than of the caller's input
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_) | AppError::JobCreationError(_) | AppError::InternalError(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => AppError::NotFound("job record".to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::DatabaseError(format!("connection pool: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidId(err.to_string())
    }
}
