//! Axum router configuration
//!
//! ```text
//! /
//! ├── /api/marketplace/collect   POST trigger, GET ?jobId= status (authenticated)
//! └── /health                    liveness plus worker statistics
//! ```

use super::auth::require_identity;
use super::state::AppState;
use crate::modules::jobs::commands::{collection_status, trigger_collection};
use crate::shared::errors::ApiError;
use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub fn build_router(state: AppState) -> Router {
    let collect_api = Router::new()
        .route(
            "/api/marketplace/collect",
            post(trigger_collection).get(collection_status),
        )
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_identity,
        ));

    Router::new()
        .merge(collect_api)
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let worker = state.worker.get_statistics().await.map_err(ApiError::from)?;

    Ok(Json(json!({
        "status": "ok",
        "worker": worker,
    })))
}
