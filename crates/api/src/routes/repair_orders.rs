//! Repair order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::OrderId;
use domain::{CreateRepairOrder, DomainError, RepairOrderService};
use order_store::{RepairOrderRecord, RepairOrderStore};
use serde::Serialize;

use crate::auth::CurrentActor;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RepairOrderStore + Clone> {
    pub service: RepairOrderService<S>,
}

#[derive(Debug, Serialize)]
pub struct RepairOrderCreatedResponse {
    pub id: String,
    pub slug: String,
}

/// POST /repair-orders: create a repair order in the actor's store.
///
/// Answers `201 Created` with a `Location` header pointing at the new order.
#[tracing::instrument(skip_all)]
pub async fn create<S: RepairOrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: CurrentActor,
    payload: Result<Json<CreateRepairOrder>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Without an actor the body is never looked at.
    let Json(cmd) = match payload {
        Ok(payload) => payload,
        Err(_) if actor.actor().is_none() => return Err(DomainError::Unauthorized.into()),
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };

    let created = state
        .service
        .create_repair_order(actor.actor(), cmd)
        .await?;

    let body = RepairOrderCreatedResponse {
        id: created.id.to_string(),
        slug: created.slug.to_string(),
    };
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, created.location)],
        Json(body),
    ))
}

/// GET /repair-orders/{id}: load an order of the actor's store.
#[tracing::instrument(skip(state, actor))]
pub async fn get<S: RepairOrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<RepairOrderRecord>, ApiError> {
    if actor.actor().is_none() {
        return Err(DomainError::Unauthorized.into());
    }
    let order_id: OrderId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid repair order id: {e}")))?;

    let order = state
        .service
        .get_repair_order(actor.actor(), order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("repair order {id} not found")))?;

    Ok(Json(order))
}
