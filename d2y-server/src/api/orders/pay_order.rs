use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use d2y_sdk::objects::OrderResponse;
use uuid::Uuid;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders/{order_id}/pay`: mark the order paid.
///
/// Repeating the call on a paid order returns it unchanged.
pub(super) async fn pay_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(order_id) = path?;
    let order = state.engine.pay_order(&caller, order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}
