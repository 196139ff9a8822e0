pub mod modules;
#[cfg(feature = "postgres")]
mod schema;
pub mod server;
pub mod shared;

use anyhow::Context;
use modules::{
    catalog::CollectorRegistry,
    jobs::{
        BackgroundWorker, CollectionService, InMemoryJobRepository, JobOrchestrator, JobQueue,
        JobRepository, JobStatusService,
    },
};
use server::{build_router, AppState, AuthProvider, StaticTokenAuth};
use shared::{
    errors::AppResult,
    utils::init_logger,
    AppConfig,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Fully wired service: handler state plus the worker that drains the job queue
pub struct Application {
    pub state: AppState,
    pub worker: Arc<BackgroundWorker>,
}

impl Application {
    /// Wire services from explicit dependencies; nothing here reads globals
    pub fn build(
        config: &AppConfig,
        jobs: Arc<dyn JobRepository>,
        collectors: CollectorRegistry,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let orchestrator = Arc::new(JobOrchestrator::new(Arc::clone(&jobs), collectors));

        let (queue, receiver) = JobQueue::bounded(config.job_queue_capacity);
        let worker = Arc::new(BackgroundWorker::new(
            Arc::clone(&orchestrator),
            receiver,
            config.worker_concurrency,
        ));

        let collection_service = Arc::new(CollectionService::new(
            orchestrator,
            queue,
            config.collection_mode,
        ));
        let status_service = Arc::new(JobStatusService::new(jobs));

        Self {
            state: AppState::new(
                collection_service,
                status_service,
                Arc::clone(&worker),
                auth,
            ),
            worker,
        }
    }
}

/// Select the job store: PostgreSQL when DATABASE_URL is set, in-memory otherwise
pub fn job_repository(config: &AppConfig) -> AppResult<Arc<dyn JobRepository>> {
    match &config.database_url {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let database = shared::Database::new(url)?;
            database.run_migrations()?;
            log::info!("Using PostgreSQL job store");
            Ok(Arc::new(modules::jobs::JobRepositoryImpl::new(
                database.pool().clone(),
            )))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => Err(shared::errors::AppError::ConfigError(
            "DATABASE_URL is set but this build has no PostgreSQL support (enable the `postgres` feature)"
                .to_string(),
        )),
        None => {
            log::warn!("DATABASE_URL not set, job records are kept in memory only");
            Ok(Arc::new(InMemoryJobRepository::new()))
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_logger();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let jobs = job_repository(&config).context("failed to initialize job store")?;

    let application = Application::build(
        &config,
        jobs,
        CollectorRegistry::from_config(&config),
        Arc::new(StaticTokenAuth::new(config.auth_tokens.clone())),
    );

    let worker = Arc::clone(&application.worker);
    let worker_handle = tokio::spawn(async move {
        worker.run().await;
    });
    log::info!(
        "Background worker initialized ({} mode, concurrency {})",
        config.collection_mode,
        config.worker_concurrency
    );

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(application.state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    application.worker.stop();
    if let Err(e) = worker_handle.await {
        log::error!("Background worker task failed: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => log::error!("failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("received SIGINT, shutting down"),
        _ = terminate => log::info!("received SIGTERM, shutting down"),
    }
}
