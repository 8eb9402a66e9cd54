use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use d2y_sdk::objects::OrderEventResponse;
use uuid::Uuid;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /orders/{order_id}/events`: the order's audit trail.
pub(super) async fn list_events(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<OrderEventResponse>>, ApiError> {
    let Path(order_id) = path?;
    let events = state.engine.order_events(&caller, order_id).await?;
    Ok(Json(events.iter().map(OrderEventResponse::from).collect()))
}
