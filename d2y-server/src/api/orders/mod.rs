//! Order API handlers.
//!
//! # Endpoints
//!
//! - `POST /orders`                      – place an order (`Idempotency-Key` optional)
//! - `GET  /orders`                      – list visible orders (paginated, code search)
//! - `GET  /orders/{order_id}`           – order detail
//! - `GET  /orders/{order_id}/events`    – audit trail, oldest first
//! - `POST /orders/{order_id}/pay`       – record payment
//! - `POST /orders/{order_id}/status`    – change fulfilment status
//! - `POST /orders/{order_id}/refund`    – refund and close the order

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod create_order;
mod get_order;
mod list_events;
mod list_orders;
mod pay_order;
mod refund_order;
mod set_status;

/// Header carrying the client's idempotency token on `POST /orders`.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Build the Order API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(list_orders::list_orders).post(create_order::create_order),
        )
        .route("/orders/{order_id}", get(get_order::get_order))
        .route("/orders/{order_id}/events", get(list_events::list_events))
        .route("/orders/{order_id}/pay", post(pay_order::pay_order))
        .route("/orders/{order_id}/status", post(set_status::set_status))
        .route("/orders/{order_id}/refund", post(refund_order::refund_order))
}
