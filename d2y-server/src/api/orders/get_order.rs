use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use d2y_sdk::objects::OrderResponse;
use uuid::Uuid;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /orders/{order_id}`: order detail with items.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(order_id) = path?;
    let order = state.engine.get_order(&caller, order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}
