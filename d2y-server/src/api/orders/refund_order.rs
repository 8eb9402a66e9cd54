use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
};
use d2y_core::lifecycle::RefundOrder;
use d2y_sdk::objects::{OrderResponse, RefundOutcome, RefundRequest, RefundResponse};
use uuid::Uuid;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders/{order_id}/refund`: refund the order (admin and support).
///
/// `amountCents` defaults to the order total; the body may be omitted.
pub(super) async fn refund_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Option<Json<RefundRequest>>, JsonRejection>,
) -> Result<Json<RefundOutcome>, ApiError> {
    let Path(order_id) = path?;
    let request = body?.map(|Json(request)| request).unwrap_or_default();
    let result = state
        .engine
        .refund_order(
            &caller,
            order_id,
            RefundOrder {
                amount_cents: request.amount_cents,
                reason: request.reason,
            },
        )
        .await?;
    Ok(Json(RefundOutcome {
        order: OrderResponse::from(&result.order),
        refund: RefundResponse::from(&result.refund),
    }))
}
