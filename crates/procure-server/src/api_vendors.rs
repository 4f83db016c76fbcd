//! Vendor API handlers.

use crate::api::{json_body, path_id, with_conn, ApiError};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    response::Json,
};
use procure_vendors::{create_vendor, delete_vendor, list_vendors, update_vendor, Vendor};
use std::sync::Arc;

const INVALID_VENDOR_ID: &str = "invalid vendor id";

/// GET /vendors
pub async fn list_vendors_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Vendor>>, ApiError> {
    let vendors = with_conn(state, |conn| Ok(list_vendors(conn)?)).await?;
    Ok(Json(vendors))
}

/// POST /vendors
///
/// Responds `201 Created` with the stored vendor, including its identity.
pub async fn create_vendor_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<Vendor>, JsonRejection>,
) -> Result<(StatusCode, Json<Vendor>), ApiError> {
    let vendor = json_body(payload)?;
    let created = with_conn(state, move |conn| Ok(create_vendor(conn, &vendor)?)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /vendors/{id}
///
/// Replaces every field. The response echoes the payload under the path
/// identity even when no such vendor exists.
pub async fn update_vendor_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Vendor>, JsonRejection>,
) -> Result<Json<Vendor>, ApiError> {
    let id = path_id(path, INVALID_VENDOR_ID)?;
    let vendor = json_body(payload)?;
    let updated = with_conn(state, move |conn| Ok(update_vendor(conn, id, &vendor)?)).await?;
    Ok(Json(updated))
}

/// DELETE /vendors/{id}
pub async fn delete_vendor_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path, INVALID_VENDOR_ID)?;
    with_conn(state, move |conn| Ok(delete_vendor(conn, id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}
