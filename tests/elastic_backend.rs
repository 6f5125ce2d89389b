//! Tests for the Elasticsearch adapter against a mock backend built with axum.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use docket::config::IndexConfig;
use docket::error::ErrorKind;
use docket::index::{ElasticIndex, SearchIndex};
use docket::models::Report;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct MockState {
    puts: Arc<Mutex<Vec<(String, Value)>>>,
    queries: Arc<Mutex<Vec<Value>>>,
}

async fn handle_put(
    State(state): State<MockState>,
    Path((_ty, id)): Path<(String, String)>,
    Json(doc): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.puts.lock().unwrap().push((id, doc));
    (StatusCode::CREATED, Json(json!({ "result": "created" })))
}

async fn handle_search(State(state): State<MockState>, Json(query): Json<Value>) -> Json<Value> {
    state.queries.lock().unwrap().push(query);
    Json(json!({
        "took": 2,
        "hits": {
            "total": { "value": 2 },
            "hits": [
                { "_score": 2.5, "_source": { "id": 4, "fileName": "d.txt", "name": "D", "author": "Dr. D", "synopsis": "d...", "text": "lung lung" } },
                { "_score": 0.7, "_source": { "id": 1, "fileName": "a.txt", "name": "A", "author": "Dr. A", "synopsis": "a...", "text": "lung" } }
            ]
        }
    }))
}

async fn handle_unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "cluster is red")
}

async fn handle_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({}))
}

async fn start_mock() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/segmed/{ty}/{id}", put(handle_put))
        .route("/segmed/report/_search", post(handle_search))
        .route("/broken/_search", post(handle_unavailable))
        .route("/broken/_doc/{id}", put(handle_unavailable))
        .route("/slow/_search", post(handle_slow))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn config(url: &str, name: &str, doc_type: Option<&str>) -> IndexConfig {
    IndexConfig {
        provider: "elasticsearch".to_string(),
        url: Some(url.to_string()),
        name: name.to_string(),
        doc_type: doc_type.map(str::to_string),
        timeout_secs: 1,
    }
}

fn report() -> Report {
    Report {
        id: 9,
        file_name: "i.txt".to_string(),
        name: "Chest X-Ray".to_string(),
        author: "Dr. Adams".to_string(),
        synopsis: "Title: Chest X-Ray\n...".to_string(),
        text: "Title: Chest X-Ray\nlung\n".to_string(),
    }
}

#[tokio::test]
async fn test_index_puts_full_document_by_id() {
    let (url, state) = start_mock().await;
    let index = ElasticIndex::new(&config(&url, "segmed", Some("report"))).unwrap();

    index.index(&report()).await.unwrap();

    let puts = state.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "9");
    assert_eq!(puts[0].1["fileName"], "i.txt");
    assert_eq!(puts[0].1["text"], "Title: Chest X-Ray\nlung\n");
}

#[tokio::test]
async fn test_search_sends_match_query_and_keeps_order() {
    let (url, state) = start_mock().await;
    let index = ElasticIndex::new(&config(&url, "segmed", Some("report"))).unwrap();

    let hits = index.search("lung").await.unwrap();
    let ids: Vec<i64> = hits.iter().map(|h| h.report.id).collect();
    assert_eq!(ids, vec![4, 1]);
    assert_eq!(hits[0].report.author, "Dr. D");
    assert!((hits[1].score - 0.7).abs() < 1e-9);

    let queries = state.queries.lock().unwrap();
    assert_eq!(queries[0], json!({ "query": { "match": { "text": "lung" } } }));
}

#[tokio::test]
async fn test_non_success_status_is_index_unavailable() {
    let (url, _state) = start_mock().await;
    let index = ElasticIndex::new(&config(&url, "broken", None)).unwrap();

    let err = index.search("lung").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    assert!(err.to_string().contains("503"));

    let err = index.index(&report()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (url, _state) = start_mock().await;
    let index = ElasticIndex::new(&config(&url, "slow", None)).unwrap();

    let err = index.search("lung").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend_is_index_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let index =
        ElasticIndex::new(&config(&format!("http://127.0.0.1:{}", port), "segmed", None)).unwrap();
    let err = index.search("lung").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
}
