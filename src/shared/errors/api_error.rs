use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::app_error::AppError;

/// Error returned from HTTP handlers, rendered as `{error, message?, details?}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.into(),
                message: None,
                details: Vec::new(),
            },
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.body.details = details;
        self
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn invalid_request(details: Vec<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request").with_details(details)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::ValidationError(msg) => Self::invalid_request(vec![msg.clone()]),
            AppError::InvalidId(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid jobId").with_message(err.to_string())
            }
            AppError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Job not found"),
            AppError::Unauthorized(_) => Self::unauthorized(),
            AppError::JobCreationError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create collection job")
                    .with_message(err.to_string())
            }
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .with_message(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
