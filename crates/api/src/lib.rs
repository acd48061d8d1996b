//! HTTP API server with observability for the perfume distribution service.
//!
//! Provides REST endpoints for stock, the perfume catalog, order placement
//! and reports, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state, create_postgres_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/stock", get(routes::stock::list))
        .route("/stock/low", get(routes::stock::low))
        .route(
            "/stock/{product_id}/{variant}",
            get(routes::stock::get).put(routes::stock::update),
        )
        .route("/stock/{product_id}/{variant}/add", post(routes::stock::add))
        .route(
            "/perfumes",
            get(routes::perfumes::list).post(routes::perfumes::create),
        )
        .route(
            "/perfumes/{id}",
            get(routes::perfumes::get).delete(routes::perfumes::deactivate),
        )
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::place),
        )
        .route("/orders/stats", get(routes::orders::stats))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/status", patch(routes::orders::update_status))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/reports/top-selling", get(routes::reports::top_selling))
        .route("/reports/by-requester", get(routes::reports::by_requester))
        .route("/reports/delivery-log", get(routes::reports::delivery_log))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
