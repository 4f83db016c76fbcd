//! Purchase order API handlers.

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
use procure_orders::{
    archive_order, create_order, delete_order, list_orders, revise_order, PurchaseOrder,
};
use std::sync::Arc;

const INVALID_PO_ID: &str = "invalid po id";

/// GET /pos
///
/// Newest orders first.
pub async fn list_orders_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<PurchaseOrder>>, ApiError> {
    let orders = with_conn(state, |conn| Ok(list_orders(conn)?)).await?;
    Ok(Json(orders))
}

/// POST /pos
///
/// A duplicate `po` is reported as a server error carrying the store's
/// message.
pub async fn create_order_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<PurchaseOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseOrder>), ApiError> {
    let order = json_body(payload)?;
    let created = with_conn(state, move |conn| Ok(create_order(conn, &order)?)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /pos/{id}/revise
pub async fn revise_order_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PurchaseOrder>, JsonRejection>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let id = path_id(path, INVALID_PO_ID)?;
    let order = json_body(payload)?;
    let revised = with_conn(state, move |conn| Ok(revise_order(conn, id, &order)?)).await?;
    Ok(Json(revised))
}

/// PUT /pos/{id}/archive
pub async fn archive_order_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path, INVALID_PO_ID)?;
    with_conn(state, move |conn| Ok(archive_order(conn, id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /pos/{id}
pub async fn delete_order_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path, INVALID_PO_ID)?;
    with_conn(state, move |conn| Ok(delete_order(conn, id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}
