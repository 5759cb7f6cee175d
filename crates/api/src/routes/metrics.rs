//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers descriptions for the metrics the service emits. Call once
/// after the recorder is installed.
pub fn describe() {
    describe_counter!(
        "repair_orders_created_total",
        "Repair orders persisted successfully"
    );
    describe_counter!(
        "repair_order_create_failures_total",
        "Rejected or failed creation requests, by error kind"
    );
    describe_counter!(
        "repair_order_slug_collisions_total",
        "Generated slugs that were already taken"
    );
    describe_counter!(
        "repair_order_store_rollbacks_total",
        "Order transactions rolled back"
    );
    describe_histogram!(
        "repair_order_create_duration_seconds",
        Unit::Seconds,
        "Time spent creating a repair order"
    );
}

/// GET /metrics: Prometheus text exposition.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
