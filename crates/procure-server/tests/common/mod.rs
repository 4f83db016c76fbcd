#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use procure_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings, IN_MEMORY_PATH};
use procure_server::{app, AppState};
use serde_json::Value;
use tower::ServiceExt;

pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3002"];

/// Builds the router over a fresh in-memory database shared by every pooled
/// connection.
pub fn setup_app() -> (Router, DbPool) {
    let pool = create_pool(IN_MEMORY_PATH, DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }

    let state = AppState {
        pool: pool.clone(),
        cors_origins: ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
    };

    (app(state), pool)
}

/// Sends a request with an optional JSON body and decodes the response body
/// as JSON (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Sends `raw` verbatim as a JSON-typed body.
pub async fn send_raw(app: &Router, method: Method, uri: &str, raw: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
