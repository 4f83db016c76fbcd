//! HTTP surface for the procurement API.
//!
//! Routes map one-to-one onto the persistence operations in
//! `procure-vendors` and `procure-orders`. Every handler receives the shared
//! [`AppState`] through an extension; nothing is held in process-wide
//! statics, so tests build their own state around an in-memory database.

pub mod api;
pub mod api_orders;
pub mod api_vendors;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, put},
    Extension, Router,
};
use procure_db::DbPool;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Builds the CORS layer for the configured origins.
///
/// Credentials are allowed, which rules out wildcards, so request headers
/// are mirrored back instead of answering `*`. Origins that are not valid
/// header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/", get(api::liveness_handler))
        .route("/health", get(api::health_handler))
        .route(
            "/vendors",
            get(api_vendors::list_vendors_handler).post(api_vendors::create_vendor_handler),
        )
        .route(
            "/vendors/{id}",
            put(api_vendors::update_vendor_handler).delete(api_vendors::delete_vendor_handler),
        )
        .route(
            "/pos",
            get(api_orders::list_orders_handler).post(api_orders::create_order_handler),
        )
        .route("/pos/{id}", delete(api_orders::delete_order_handler))
        .route("/pos/{id}/revise", put(api_orders::revise_order_handler))
        .route("/pos/{id}/archive", put(api_orders::archive_order_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
