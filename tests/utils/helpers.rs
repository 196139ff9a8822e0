/// Test helper functions and service builders
use super::factories::{test_config, TEST_TOKEN};
use serde_json::Value;
use shelfscout_lib::modules::catalog::CollectorRegistry;
use shelfscout_lib::modules::jobs::{BackgroundWorker, InMemoryJobRepository};
use shelfscout_lib::server::{build_router, StaticTokenAuth};
use shelfscout_lib::shared::CollectionMode;
use shelfscout_lib::Application;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running service instance bound to an ephemeral local port
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub jobs: Arc<InMemoryJobRepository>,
    pub worker: Arc<BackgroundWorker>,
    server: JoinHandle<()>,
    worker_handle: JoinHandle<()>,
}

impl TestApp {
    pub fn collect_url(&self) -> String {
        format!("http://{}/api/marketplace/collect", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn trigger(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.collect_url())
            .bearer_auth(TEST_TOKEN)
            .json(&body)
            .send()
            .await
            .expect("trigger request failed")
    }

    pub async fn status(&self, job_id: &str) -> reqwest::Response {
        self.client
            .get(self.collect_url())
            .bearer_auth(TEST_TOKEN)
            .query(&[("jobId", job_id)])
            .send()
            .await
            .expect("status request failed")
    }

    /// Poll the status endpoint until the job is completed or failed
    pub async fn wait_for_terminal(&self, job_id: &str) -> Value {
        for _ in 0..100 {
            let body: Value = self.status(job_id).await.json().await.unwrap();
            let status = body["job"]["status"].as_str().unwrap_or_default().to_string();
            if status == "completed" || status == "failed" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} did not reach a terminal state", job_id);
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.worker.stop();
        self.server.abort();
        self.worker_handle.abort();
    }
}

/// Start the full service with an in-memory store and the given collectors
pub async fn spawn_app(mode: CollectionMode, collectors: CollectorRegistry) -> TestApp {
    let config = test_config(mode);
    let jobs = Arc::new(InMemoryJobRepository::new());

    let application = Application::build(
        &config,
        jobs.clone(),
        collectors,
        Arc::new(StaticTokenAuth::new(config.auth_tokens.clone())),
    );

    let worker = Arc::clone(&application.worker);
    let worker_handle = tokio::spawn(Arc::clone(&worker).run());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(application.state);
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        jobs,
        worker,
        server,
        worker_handle,
    }
}

/// Run background worker for a specified duration then stop it
pub async fn run_worker_for(worker: Arc<BackgroundWorker>, duration: Duration) {
    let handle = tokio::spawn(Arc::clone(&worker).run());
    tokio::time::sleep(duration).await;
    worker.stop();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
}
