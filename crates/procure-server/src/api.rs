//! Shared plumbing for the HTTP handlers: the error type, body and path
//! decoding, and the bridge onto blocking database calls.

use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use procure_orders::OrderError;
use procure_vendors::VendorError;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<VendorError> for ApiError {
    fn from(e: VendorError) -> Self {
        tracing::error!(error = %e, "vendor operation failed");
        ApiError::InternalServerError(e.to_string())
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        tracing::error!(
            error = %e,
            constraint = e.is_constraint_violation(),
            "purchase order operation failed"
        );
        ApiError::InternalServerError(e.to_string())
    }
}

/// Unwraps an integer identity from the path, rejecting anything else with
/// `message`.
pub(crate) fn path_id(
    path: Result<Path<i64>, PathRejection>,
    message: &str,
) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected path identity");
        ApiError::BadRequest(message.to_string())
    })
}

/// Unwraps a JSON body, turning any decoding failure into a client error.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Runs `op` on a pooled connection on the blocking thread pool.
///
/// The statement runs to completion even if the client goes away.
pub(crate) async fn with_conn<T, F>(state: Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection");
            ApiError::InternalServerError(format!("db connection failed: {}", e))
        })?;
        op(&conn)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "database task join error");
        ApiError::InternalServerError(format!("task join error: {}", e))
    })?
}

/// Handler for `GET /`.
pub async fn liveness_handler() -> &'static str {
    "Vendor API is running"
}

/// Handler for `GET /health`.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
