//! HTTP API server with observability for the repair-order system.
//!
//! Provides REST endpoints for creating and reading repair orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use domain::{PhoneRegion, RepairOrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::RepairOrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::repair_orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RepairOrderStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/repair-orders", post(routes::repair_orders::create::<S>))
        .route("/repair-orders/{id}", get(routes::repair_orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(auth::extract_actor))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store.
pub fn create_state<S: RepairOrderStore + Clone + 'static>(
    store: S,
    phone_region: PhoneRegion,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        service: RepairOrderService::new(store).with_region(phone_region),
    })
}
