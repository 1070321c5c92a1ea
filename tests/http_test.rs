//! End-to-end tests of the HTTP surface over a temporary SQLite database.
//!
//! Requests go through the full router (CORS, body limit, extractors) with
//! `tower::ServiceExt::oneshot`, without binding a socket.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use dry_beans_api::config::PoolOptions;
use dry_beans_api::db::{BeanStore, DbPool, bootstrap};
use dry_beans_api::models::ConnectionTarget;
use dry_beans_api::routes::{self, AppState};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_app(static_dir: Option<&Path>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("api.db").display());
    let target = ConnectionTarget::from_url(&url).unwrap();
    let pool = DbPool::connect(&target, &PoolOptions::default())
        .await
        .unwrap();
    let store = BeanStore::new(pool, Duration::from_secs(5));
    bootstrap::ensure_schema(&store).await.unwrap();
    (routes::router(AppState::new(store), static_dir), dir)
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn error(&self) -> String {
        self.json()["error"].as_str().unwrap().to_string()
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Body>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder.body(body.unwrap_or_else(Body::empty)).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> Reply {
    send(app, method, uri, Some(Body::from(body.to_string()))).await
}

#[tokio::test]
async fn test_bean_lifecycle() {
    let (app, _dir) = setup_app(None).await;

    let created = send_json(
        &app,
        Method::POST,
        "/beans",
        json!({ "bean_class": "seker", "area": 28395, "perimeter": "610.291" }),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let bean = created.json();
    let id = bean["id"].as_i64().unwrap();
    assert_eq!(bean["bean_class"], "SEKER");
    assert_eq!(bean["area"], 28395.0);
    assert_eq!(bean["perimeter"], 610.291);
    assert_eq!(bean["version"], 1);
    assert_eq!(
        created.headers[header::LOCATION].to_str().unwrap(),
        format!("/beans/{}", id)
    );

    let fetched = send(&app, Method::GET, &format!("/beans/{}", id), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), bean);
    assert_eq!(
        fetched.headers[header::CACHE_CONTROL].to_str().unwrap(),
        "public, max-age=3600"
    );

    let updated = send_json(
        &app,
        Method::PUT,
        &format!("/beans/{}", id),
        json!({ "area": 30000.5, "version": 1 }),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["area"], 30000.5);
    assert_eq!(updated.json()["version"], 2);

    let deleted = send(&app, Method::DELETE, &format!("/beans/{}", id), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_empty());

    let missing = send(&app, Method::GET, &format!("/beans/{}", id), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error(), "Bean not found");
}

#[tokio::test]
async fn test_listing_filters_and_pages() {
    let (app, _dir) = setup_app(None).await;
    for class in ["SEKER", "SIRA", "SEKER", "CALI"] {
        let reply = send_json(&app, Method::POST, "/beans", json!({ "bean_class": class })).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let all = send(&app, Method::GET, "/beans", None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.json().as_array().unwrap().len(), 4);

    let seker = send(&app, Method::GET, "/beans?bean_class=seker", None).await;
    let seker = seker.json();
    let seker = seker.as_array().unwrap();
    assert_eq!(seker.len(), 2);
    assert!(seker.iter().all(|b| b["bean_class"] == "SEKER"));

    let page = send(&app, Method::GET, "/beans?page=2&limit=3", None).await;
    assert_eq!(page.json().as_array().unwrap().len(), 1);

    let summaries = send(&app, Method::GET, "/", None).await;
    assert_eq!(summaries.status, StatusCode::OK);
    let summaries = summaries.json();
    assert_eq!(summaries[0], json!({ "id": 1, "bean_class": "SEKER" }));
    assert_eq!(summaries.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_query_is_rejected() {
    let (app, _dir) = setup_app(None).await;

    for uri in [
        "/beans?bean_class=pinto",
        "/beans?page=0&limit=10",
        "/beans?page=abc&limit=10",
    ] {
        let reply = send(&app, Method::GET, uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(!reply.error().is_empty());
    }
}

#[tokio::test]
async fn test_invalid_ids_are_rejected() {
    let (app, _dir) = setup_app(None).await;

    for uri in ["/beans/abc", "/beans/0", "/beans/-3"] {
        let reply = send(&app, Method::GET, uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply.error(), "Invalid ID format");
    }

    let reply = send(&app, Method::DELETE, "/beans/abc", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let (app, _dir) = setup_app(None).await;

    let reply = send(&app, Method::POST, "/beans", Some(Body::from("{not json"))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send_json(&app, Method::POST, "/beans", json!([1, 2])).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Request body must be a JSON object");

    let reply = send_json(
        &app,
        Method::POST,
        "/beans",
        json!({ "bean_class": "SIRA", "area": "abc" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "area must be a number");

    let reply = send_json(
        &app,
        Method::POST,
        "/beans",
        json!({ "bean_class": "SIRA", "colour": "red" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "unknown field: colour");

    let reply = send_json(&app, Method::POST, "/beans", json!({ "area": 1.0 })).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // Nothing above reached the table.
    let all = send(&app, Method::GET, "/beans", None).await;
    assert!(all.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_update_is_rejected() {
    let (app, _dir) = setup_app(None).await;
    send_json(&app, Method::POST, "/beans", json!({ "bean_class": "CALI" })).await;

    let reply = send_json(&app, Method::PUT, "/beans/1", json!({})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "No fields to update");

    let reply = send_json(&app, Method::PUT, "/beans/99", json!({ "area": 2.0 })).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conflicts() {
    let (app, _dir) = setup_app(None).await;

    let first = send_json(
        &app,
        Method::POST,
        "/beans",
        json!({ "id": 10, "bean_class": "CALI" }),
    )
    .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let duplicate = send_json(
        &app,
        Method::POST,
        "/beans",
        json!({ "id": 10, "bean_class": "SIRA" }),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error(), "Bean with this ID already exists");

    let bump = send_json(
        &app,
        Method::PUT,
        "/beans/10",
        json!({ "extent": 0.7, "version": 1 }),
    )
    .await;
    assert_eq!(bump.status, StatusCode::OK);

    let stale = send_json(
        &app,
        Method::PUT,
        "/beans/10",
        json!({ "extent": 0.1, "version": 1 }),
    )
    .await;
    assert_eq!(stale.status, StatusCode::CONFLICT);

    let current = send(&app, Method::GET, "/beans/10", None).await;
    assert_eq!(current.json()["extent"], 0.7);
    assert_eq!(current.json()["version"], 2);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _dir) = setup_app(None).await;

    let reply = send(&app, Method::GET, "/test-connection", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 9);

    let reply = send(&app, Method::GET, "/test-db", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert!(body["db_size"].as_i64().unwrap() > 0);
    assert!(body["time"].is_string());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_api_docs() {
    let (app, _dir) = setup_app(None).await;

    let ui = send(&app, Method::GET, "/api-docs", None).await;
    assert_eq!(ui.status, StatusCode::OK);
    assert!(
        ui.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert!(String::from_utf8_lossy(&ui.body).contains("swagger-ui"));

    let doc = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(doc.status, StatusCode::OK);
    let doc = doc.json();
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert!(doc["paths"]["/beans/{id}"]["put"].is_object());
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let (app, _dir) = setup_app(None).await;

    let reply = send(&app, Method::GET, "/nope", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "Not found");
}

#[tokio::test]
async fn test_static_files_serve_unmatched_paths() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("index.html"), "<h1>beans</h1>").unwrap();
    let (app, _dir) = setup_app(Some(assets.path())).await;

    let reply = send(&app, Method::GET, "/index.html", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, b"<h1>beans</h1>");

    // API routes still win over the static directory.
    let reply = send(&app, Method::GET, "/test-connection", None).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&app, Method::GET, "/missing.html", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "Not found");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _dir) = setup_app(None).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/beans")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
