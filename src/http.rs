//! HTTP Control Surface (C13): `axum` router exposing the three endpoints
//! named in spec.md §6 — `startIndexing`, `stopIndexing`, `indexPage` — each
//! mapping the Coordinator's `Result` onto a `{"result", "error"?}` JSON
//! body with status 200 on success, 400 on a rejected request.
//!
//! The teacher crate exposes its crawl controls through an MCP tool layer
//! rather than a plain HTTP router; `axum`'s `Router`/`IntoResponse` shape,
//! grounded on the `labs/28-web-server-axum` example in the retrieval pack,
//! is the closest idiomatic substitute for the control surface spec.md §6
//! names.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::coordinator::IndexingCoordinator;
use crate::errors::IndexError;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<IndexingCoordinator>,
}

/// `{"result": true}` / `{"result": false, "error": "..."}` (spec.md §6):
/// `result` is a JSON boolean, not a status string, on every endpoint.
#[derive(Debug, Serialize)]
struct ApiResponse {
    result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Response {
        (StatusCode::OK, Json(Self { result: true, error: None })).into_response()
    }

    /// Most rejections surface the Coordinator's own `Display` text
    /// verbatim (it already matches spec.md §6's literal strings for
    /// `AlreadyRunning`/`NotRunning`). `MalformedUrl` is the one exception:
    /// its `Display` carries the offending URL for logs, but spec.md §6's
    /// `indexPage` contract requires the fixed literal `"Invalid URL"`.
    fn rejected(err: &IndexError) -> Response {
        let message = match err {
            IndexError::MalformedUrl(_) => "Invalid URL".to_string(),
            other => other.to_string(),
        };
        (
            StatusCode::BAD_REQUEST,
            Json(Self { result: false, error: Some(message) }),
        )
            .into_response()
    }
}

pub fn router(coordinator: Arc<IndexingCoordinator>) -> Router {
    Router::new()
        .route("/api/startIndexing", get(start_indexing))
        .route("/api/stopIndexing", get(stop_indexing))
        .route("/api/indexPage", post(index_page))
        .with_state(AppState { coordinator })
}

async fn start_indexing(State(state): State<AppState>) -> Response {
    match state.coordinator.start_indexing().await {
        Ok(()) => ApiResponse::ok(),
        Err(e) => ApiResponse::rejected(&e),
    }
}

async fn stop_indexing(State(state): State<AppState>) -> Response {
    match state.coordinator.stop_indexing() {
        Ok(()) => ApiResponse::ok(),
        Err(e) => ApiResponse::rejected(&e),
    }
}

#[derive(Debug, Deserialize)]
struct IndexPageQuery {
    url: String,
}

async fn index_page(State(state): State<AppState>, Query(query): Query<IndexPageQuery>) -> Response {
    match state.coordinator.index_page(&query.url).await {
        Ok(_) => ApiResponse::ok(),
        Err(e) => ApiResponse::rejected(&e),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{LemmaCache, PageUrlCache};
    use crate::config::IndexingConfig;
    use crate::events::ErrorsSink;
    use crate::fetch::{FetchResult, Fetcher};
    use crate::lemma::LemmaAnalyzer;
    use crate::lemma_writer::LemmaIndexWriter;
    use crate::reindexer::SinglePageReindexer;
    use crate::scheduler::CrawlScheduler;
    use crate::site_indexer::SiteIndexer;
    use crate::store::PageStore;

    struct OkFetcher;

    #[async_trait]
    impl Fetcher for OkFetcher {
        async fn fetch(&self, url: &str) -> crate::errors::IndexResult<FetchResult> {
            Ok(FetchResult { status_code: 200, final_url: url.to_string(), document: "cat".to_string() })
        }
    }

    async fn test_router() -> Router {
        let store = Arc::new(PageStore::connect(":memory:").await.expect("store"));
        let analyzer = Arc::new(LemmaAnalyzer::new().expect("analyzer"));
        let lemma_cache = Arc::new(LemmaCache::new(100));
        let page_url_cache = Arc::new(PageUrlCache::new(100, Duration::from_secs(600)));
        let errors = Arc::new(ErrorsSink::new());
        let writer = Arc::new(LemmaIndexWriter::new(store.clone(), lemma_cache.clone(), 5000));
        let fetcher: Arc<dyn Fetcher> = Arc::new(OkFetcher);
        let scheduler = CrawlScheduler::new(
            fetcher.clone(), analyzer.clone(), page_url_cache.clone(), writer.clone(), errors.clone(), 4, HashSet::new(),
        );
        let site_indexer = Arc::new(SiteIndexer::new(store.clone(), scheduler));
        let reindexer = Arc::new(SinglePageReindexer::new(fetcher, analyzer, writer, HashSet::new()));
        let coordinator = Arc::new(IndexingCoordinator::new(
            store, site_indexer, reindexer, lemma_cache, page_url_cache, errors, IndexingConfig::default(),
        ));
        router(coordinator)
    }

    #[tokio::test]
    async fn start_then_stop_round_trips() {
        let app = test_router().await;
        let response = app
            .clone()
            .oneshot(axum::http::Request::get("/api/startIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(axum::http::Request::get("/api/stopIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stop_before_start_is_bad_request() {
        let app = test_router().await;
        let response = app
            .oneshot(axum::http::Request::get("/api/stopIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_page_out_of_scope_is_bad_request() {
        let app = test_router().await;
        let response = app
            .oneshot(
                axum::http::Request::post("/api/indexPage?url=http://unknown.test/a")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["result"], serde_json::json!(false));
        assert_eq!(json["error"], serde_json::json!("URL is outside configured sites"));
    }

    #[tokio::test]
    async fn index_page_malformed_url_reports_invalid_url() {
        let app = test_router().await;
        let response = app
            .oneshot(
                axum::http::Request::post("/api/indexPage?url=not-a-valid-url")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["result"], serde_json::json!(false));
        // spec.md §6: the indexPage literal is "Invalid URL", not the
        // MalformedUrl Display text (which would leak the raw input).
        assert_eq!(json["error"], serde_json::json!("Invalid URL"));
    }

    #[tokio::test]
    async fn start_indexing_twice_reports_spec_literal_message() {
        let app = test_router().await;
        app.clone()
            .oneshot(axum::http::Request::get("/api/startIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        let response = app
            .oneshot(axum::http::Request::get("/api/startIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], serde_json::json!("Indexing is already running"));
    }

    #[tokio::test]
    async fn stop_indexing_without_a_run_reports_spec_literal_message() {
        let app = test_router().await;
        let response = app
            .oneshot(axum::http::Request::get("/api/stopIndexing").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], serde_json::json!("Indexing is not running"));
    }
}
