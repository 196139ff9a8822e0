/// Local stand-in for the marketplace: the data API under `/v1/search` and
/// HTML result pages under `/s`.
///
/// The keywords select the scenario:
/// - `gardening`: two pages, one ASIN repeated across them (3 distinct books)
/// - `nothing`: an empty result set
/// - `throttled`: 429 from the API, 503 block page from the site
/// - `rejected`: 400 with an error body from the API
/// - `broken`: 500 from both
/// - `captcha`: a captcha interstitial from the site
/// - anything else: an unrecognized page / a non-JSON API body
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Hits {
    api: AtomicUsize,
    pages: AtomicUsize,
}

pub struct MockMarketplace {
    pub addr: SocketAddr,
    hits: Arc<Hits>,
    handle: JoinHandle<()>,
}

impl MockMarketplace {
    pub async fn start() -> Self {
        let hits = Arc::new(Hits::default());
        let router = Router::new()
            .route("/v1/search", get(search))
            .route("/s", get(result_page))
            .with_state(Arc::clone(&hits));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, hits, handle }
    }

    pub fn api_base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn site_base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_requests(&self) -> usize {
        self.hits.api.load(Ordering::SeqCst)
    }

    pub fn page_requests(&self) -> usize {
        self.hits.pages.load(Ordering::SeqCst)
    }
}

impl Drop for MockMarketplace {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn page_number(params: &HashMap<String, String>) -> u32 {
    params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

fn api_item(asin: &str, title: &str) -> serde_json::Value {
    json!({
        "asin": asin,
        "title": title,
        "authors": ["Edward C. Smith"],
        "price": {"amount": 18.49, "currency": "USD"},
        "rating": 4.6,
        "reviewCount": 1200,
        "detailPageUrl": format!("https://www.marketplace.example.com/dp/{}", asin),
    })
}

async fn search(
    State(hits): State<Arc<Hits>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.api.fetch_add(1, Ordering::SeqCst);
    let keywords = params.get("keywords").map(String::as_str).unwrap_or_default();
    let page = page_number(&params);

    match keywords {
        "gardening" => {
            let items = if page == 1 {
                vec![
                    api_item("B000000001", "The Vegetable Gardener's Bible"),
                    api_item("B000000002", "Square Foot Gardening"),
                ]
            } else {
                vec![
                    api_item("B000000002", "Square Foot Gardening"),
                    api_item("B000000003", "The Well-Tempered Garden"),
                ]
            };
            Json(json!({"items": items, "page": page, "totalPages": 2})).into_response()
        }
        "nothing" => Json(json!({"items": [], "page": 1, "totalPages": 0})).into_response(),
        "throttled" => (
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", "30")],
            "slow down",
        )
            .into_response(),
        "rejected" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": "InvalidParameter", "message": "keywords too long"}})),
        )
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response(),
        _ => "this is not json".into_response(),
    }
}

fn result_item(asin: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div data-asin="{asin}" data-component-type="s-search-result" class="s-result-item">
            <img class="s-image" src="https://images.example.com/{asin}.jpg" alt="">
            <h2><a href="/item/dp/{asin}/ref=sr_1"><span class="a-text-normal">{title}</span></a></h2>
            <div class="a-row"><span class="a-size-base">by </span><a class="a-size-base" href="/author">Edward C. Smith</a></div>
            <span class="a-icon-alt">4.5 out of 5 stars</span>
            <span aria-label="870 ratings"></span>
            <span class="a-price"><span class="a-offscreen">{price}</span></span>
        </div>"#
    )
}

fn gardening_page(page: u32) -> String {
    let (items, next) = if page == 1 {
        (
            [
                result_item("B000GARDN1", "The Vegetable Gardener&#39;s Bible", "$18.49"),
                result_item("B000GARDN2", "Square Foot Gardening", "$14.99"),
            ],
            r#"<a href="/s?k=gardening&page=2" class="s-pagination-item s-pagination-next">Next</a>"#,
        )
    } else {
        (
            [
                result_item("B000GARDN2", "Square Foot Gardening", "$14.99"),
                result_item("B000GARDN3", "The Well-Tempered Garden", "$21.00"),
            ],
            r#"<span class="s-pagination-item s-pagination-next s-pagination-disabled">Next</span>"#,
        )
    };

    format!(
        r#"<html><body><div class="s-main-slot s-result-list">{}</div>{}</body></html>"#,
        items.join("\n"),
        next
    )
}

async fn result_page(
    State(hits): State<Arc<Hits>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.pages.fetch_add(1, Ordering::SeqCst);
    let keywords = params.get("k").map(String::as_str).unwrap_or_default();
    let page = page_number(&params);

    match keywords {
        "gardening" => Html(gardening_page(page)).into_response(),
        "nothing" => Html(
            r#"<html><body><div class="s-no-results"><span>No results for nothing.</span></div></body></html>"#,
        )
        .into_response(),
        "throttled" => (StatusCode::SERVICE_UNAVAILABLE, Html("<h1>Service Unavailable</h1>"))
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response(),
        "captcha" => Html(
            r#"<html><body><form action="/errors/validateCaptcha"><p>Enter the characters you see below</p></form></body></html>"#,
        )
        .into_response(),
        _ => Html("<html><body><h1>Welcome</h1></body></html>").into_response(),
    }
}
