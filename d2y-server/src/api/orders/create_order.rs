use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use d2y_core::lifecycle::CreateOrder;
use d2y_sdk::objects::{CreateOrderRequest, OrderResponse};

use super::IDEMPOTENCY_KEY_HEADER;
use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders`: place an order for the calling consumer.
///
/// Answers `201 Created` for a new order and `200 OK` when the
/// `Idempotency-Key` matches an order this consumer already placed.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    headers: HeaderMap,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|v| {
            v.to_str()
                .map(str::to_owned)
                .map_err(|_| ApiError::BadRequest("Idempotency-Key must be ASCII".into()))
        })
        .transpose()?;
    let Json(request) = body?;

    let outcome = state
        .engine
        .create_order(&caller, CreateOrder::from_request(request, idempotency_key))
        .await?;

    let status = if outcome.is_replay() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(OrderResponse::from(outcome.order()))))
}
