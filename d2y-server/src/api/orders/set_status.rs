use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
};
use d2y_sdk::objects::{OrderResponse, UpdateStatusRequest};
use uuid::Uuid;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders/{order_id}/status`: move the order to `{status}`.
pub(super) async fn set_status(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(order_id) = path?;
    let Json(request) = body?;
    let order = state
        .engine
        .set_status(&caller, order_id, request.status.into())
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
