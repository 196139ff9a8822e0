use super::auth::AuthProvider;
use crate::modules::jobs::{BackgroundWorker, CollectionService, JobStatusService};
use std::sync::Arc;

/// Shared handler state; every dependency is injected at startup
#[derive(Clone)]
pub struct AppState {
    pub collections: Arc<CollectionService>,
    pub status: Arc<JobStatusService>,
    pub worker: Arc<BackgroundWorker>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(
        collections: Arc<CollectionService>,
        status: Arc<JobStatusService>,
        worker: Arc<BackgroundWorker>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            collections,
            status,
            worker,
            auth,
        }
    }
}
