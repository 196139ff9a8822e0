use super::application::service::TriggerCollection;
use super::domain::entities::JobView;
use crate::modules::catalog::CollectionMethod;
use crate::server::auth::CallerIdentity;
use crate::server::state::AppState;
use crate::shared::errors::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCollectionRequest {
    pub keywords: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub method: CollectionMethod,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCollectionResponse {
    pub success: bool,
    pub job: JobView,
    pub books_collected: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job: JobView,
}

/// POST /api/marketplace/collect
pub async fn trigger_collection(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<TriggerCollectionRequest>, JsonRejection>,
) -> Result<Json<TriggerCollectionResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected collection request body: {}", rejection.body_text());
        ApiError::invalid_request(vec![rejection.body_text()])
    })?;

    tracing::info!(
        "Collection requested by {}: '{}' via {}",
        caller.subject,
        request.keywords,
        request.method
    );

    let outcome = state
        .collections
        .trigger(TriggerCollection {
            keywords: request.keywords,
            category: request.category,
            method: request.method,
            category_id: request.category_id,
        })
        .await
        .map_err(|e| {
            if e.is_store_failure() {
                tracing::error!("Collection request failed: {}", e);
            }
            ApiError::from(e)
        })?;

    Ok(Json(TriggerCollectionResponse {
        success: outcome.success,
        books_collected: outcome.books_collected,
        message: outcome.message,
        job: JobView::from(outcome.job),
    }))
}

/// GET /api/marketplace/collect?jobId=
pub async fn collection_status(
    State(state): State<AppState>,
    query: Result<Query<JobStatusQuery>, QueryRejection>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::invalid_request(vec![rejection.body_text()]))?;

    let job_id = query
        .job_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request(vec!["jobId: query parameter is required".to_string()]))?;

    let job = state.status.query(&job_id).await.map_err(|e| {
        if e.is_store_failure() {
            tracing::error!("Job status lookup failed: {}", e);
        }
        ApiError::from(e)
    })?;

    Ok(Json(JobStatusResponse { job }))
}
