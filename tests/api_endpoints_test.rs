/// End-to-end tests of the collection endpoints over real HTTP
mod utils;

use reqwest::StatusCode;
use serde_json::{json, Value};
use shelfscout_lib::modules::catalog::CollectorError;
use shelfscout_lib::modules::jobs::JobRepository;
use shelfscout_lib::shared::CollectionMode;
use utils::factories::{registry, BookFactory, StubCollector, TEST_TOKEN};
use utils::helpers::spawn_app;
use uuid::Uuid;

#[tokio::test]
async fn test_async_collection_completes_and_is_pollable() {
    let scraping = StubCollector::returning(BookFactory::many(3));
    let app = spawn_app(
        CollectionMode::Async,
        registry(StubCollector::returning(Vec::new()), scraping.clone()),
    )
    .await;

    let response = app
        .trigger(json!({
            "keywords": "gardening",
            "category": "Home & Garden",
            "method": "scraping",
            "categoryId": "cat-42"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["booksCollected"], 0);
    assert_eq!(body["message"], "Collection job queued");
    assert_eq!(body["job"]["jobType"], "scraping");
    assert_eq!(body["job"]["categoryId"], "cat-42");
    assert_eq!(body["job"]["parameters"]["keywords"], "gardening");
    assert_eq!(body["job"]["parameters"]["category"], "Home & Garden");

    let job_id = body["job"]["id"].as_str().unwrap().to_string();
    let finished = app.wait_for_terminal(&job_id).await;
    assert_eq!(finished["job"]["status"], "completed");
    assert_eq!(finished["job"]["booksCollected"], 3);
    assert!(finished["job"]["errorMessage"].is_null());
    assert!(finished["job"]["startedAt"].is_string());
    assert!(finished["job"]["completedAt"].is_string());
    assert_eq!(scraping.calls(), 1);

    // A terminal job never changes
    let first = app.status(&job_id).await.text().await.unwrap();
    let second = app.status(&job_id).await.text().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_job_keeps_parameters_as_sent() {
    let app = spawn_app(
        CollectionMode::Async,
        registry(StubCollector::returning(Vec::new()), StubCollector::returning(Vec::new())),
    )
    .await;

    let response = app
        .trigger(json!({
            "keywords": "  Gardening  ",
            "category": "   ",
            "categoryId": " cat-42 "
        }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let job_id = body["job"]["id"].as_str().unwrap().to_string();
    let finished = app.wait_for_terminal(&job_id).await;
    assert_eq!(
        finished["job"]["parameters"],
        json!({"keywords": "  Gardening  ", "category": "   "})
    );
    assert_eq!(finished["job"]["categoryId"], " cat-42 ");
}

#[tokio::test]
async fn test_failed_collection_reports_cause() {
    let app = spawn_app(
        CollectionMode::Async,
        registry(
            StubCollector::failing(CollectorError::rate_limited("too many requests")),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    let body: Value = app
        .trigger(json!({"keywords": "gardening", "method": "api"}))
        .await
        .json()
        .await
        .unwrap();

    let finished = app
        .wait_for_terminal(body["job"]["id"].as_str().unwrap())
        .await;
    assert_eq!(finished["job"]["status"], "failed");
    assert!(finished["job"]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("too many requests"));
    assert_eq!(finished["job"]["booksCollected"], 0);
}

#[tokio::test]
async fn test_sync_mode_returns_terminal_job() {
    let api = StubCollector::returning(BookFactory::many(2));
    let app = spawn_app(
        CollectionMode::Sync,
        registry(api.clone(), StubCollector::returning(Vec::new())),
    )
    .await;

    let response = app.trigger(json!({"keywords": "roses"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["booksCollected"], 2);
    assert_eq!(body["job"]["status"], "completed");
    assert_eq!(body["job"]["jobType"], "api");
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_sync_mode_failure_is_not_an_http_error() {
    let app = spawn_app(
        CollectionMode::Sync,
        registry(
            StubCollector::returning(Vec::new()),
            StubCollector::failing(CollectorError::Parse("unrecognized page".into())),
        ),
    )
    .await;

    let response = app
        .trigger(json!({"keywords": "roses", "method": "scraping"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["job"]["status"], "failed");
    assert!(body["message"].as_str().unwrap().contains("unrecognized page"));
}

#[tokio::test]
async fn test_blank_keywords_rejected_without_creating_job() {
    let scraping = StubCollector::returning(Vec::new());
    let app = spawn_app(
        CollectionMode::Async,
        registry(StubCollector::returning(Vec::new()), scraping.clone()),
    )
    .await;

    let response = app
        .trigger(json!({"keywords": "", "method": "scraping"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request");
    assert!(body["details"][0].as_str().unwrap().starts_with("keywords"));
    assert!(app.jobs.is_empty());
    assert_eq!(scraping.calls(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_rejected() {
    let app = spawn_app(
        CollectionMode::Async,
        registry(
            StubCollector::returning(Vec::new()),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    for body in [
        json!({"keywords": "roses", "method": "telepathy"}),
        json!({"method": "api"}),
        json!({"keywords": 42}),
    ] {
        let response = app.trigger(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .client
        .post(app.collect_url())
        .bearer_auth(TEST_TOKEN)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.jobs.is_empty());
}

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let api = StubCollector::returning(Vec::new());
    let app = spawn_app(
        CollectionMode::Async,
        registry(api.clone(), StubCollector::returning(Vec::new())),
    )
    .await;

    let response = app
        .client
        .post(app.collect_url())
        .json(&json!({"keywords": "gardening"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Unauthorized"}));

    // Authentication is checked before the body
    let response = app
        .client
        .post(app.collect_url())
        .json(&json!({"keywords": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .post(app.collect_url())
        .bearer_auth("wrong-token")
        .json(&json!({"keywords": "gardening"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .get(app.collect_url())
        .query(&[("jobId", Uuid::new_v4().to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(app.jobs.is_empty());
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_api_key_header_accepted() {
    let app = spawn_app(
        CollectionMode::Sync,
        registry(
            StubCollector::returning(Vec::new()),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    let response = app
        .client
        .post(app.collect_url())
        .header("X-API-Key", TEST_TOKEN)
        .json(&json!({"keywords": "gardening"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_query_errors() {
    let app = spawn_app(
        CollectionMode::Async,
        registry(
            StubCollector::returning(Vec::new()),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    let response = app
        .client
        .get(app.collect_url())
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.status("   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.status("not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid jobId");

    let response = app.status(&Uuid::new_v4().to_string()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Job not found");
}

#[tokio::test]
async fn test_status_matches_stored_job() {
    let app = spawn_app(
        CollectionMode::Sync,
        registry(
            StubCollector::returning(BookFactory::many(1)),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    let body: Value = app
        .trigger(json!({"keywords": "gardening"}))
        .await
        .json()
        .await
        .unwrap();
    let job_id = body["job"]["id"].as_str().unwrap();

    let status: Value = app.status(job_id).await.json().await.unwrap();
    assert_eq!(status["job"], body["job"]);

    let stored = app.jobs.get(Uuid::parse_str(job_id).unwrap()).await.unwrap();
    assert_eq!(stored.books_collected, 1);
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = spawn_app(
        CollectionMode::Async,
        registry(
            StubCollector::returning(Vec::new()),
            StubCollector::returning(Vec::new()),
        ),
    )
    .await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["worker"]["totalJobs"], 0);
}
