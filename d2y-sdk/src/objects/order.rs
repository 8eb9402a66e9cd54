//! Order request and response types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::slot::SlotWindowResponse;

/// Order fulfilment status.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `d2y-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Paid,
    Accepted,
    Packing,
    ReadyForPickup,
    Cancelled,
    Refunded,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Placed => write!(f, "PLACED"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Packing => write!(f, "PACKING"),
            OrderStatus::ReadyForPickup => write!(f, "READY_FOR_PICKUP"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Payment status, orthogonal to [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "UNPAID"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Frozen money snapshot taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyTotals {
    pub currency: String,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    pub items_count: i64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A single line of a create-order request.
///
/// `qty` is signed so that zero and negative quantities reach validation
/// and are rejected with `invalid_input` instead of a body parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: String,
    pub qty: i64,
}

/// Request body for `POST /orders`.
///
/// The idempotency token travels in the `Idempotency-Key` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub merchant_id: String,
    pub slot_id: String,
    pub address: serde_json::Value,
    #[serde(default)]
    pub instructions: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

/// Request body for `POST /orders/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Request body for `POST /orders/{id}/refund`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

const MAX_LIMIT: i64 = 100;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for `GET /orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    /// Case-insensitive substring of the order code.
    pub q: Option<String>,
    /// Page size; the server's configured default when absent.
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub qty: i64,
}

/// Order row as shown in lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub order_code: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub consumer_id: String,
    pub merchant_id: String,
    pub merchant_name: String,
    pub slot_id: String,
    pub slot: SlotWindowResponse,
    pub totals: MoneyTotals,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Response of `GET /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPageResponse {
    pub orders: Vec<OrderSummaryResponse>,
    pub limit: i64,
    pub offset: i64,
}

/// Full order detail, including the frozen address and line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub summary: OrderSummaryResponse,
    pub address: serde_json::Value,
    pub instructions: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub items: Vec<OrderItemResponse>,
}

/// One entry of an order's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub actor_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount_cents: i64,
    pub reason: Option<String>,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Response of `POST /orders/{id}/refund`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub order: OrderResponse,
    pub refund: RefundResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(500, 10), (100, 10));
        assert_eq!(clamp_pagination(20, 1_000_000), (20, MAX_OFFSET));
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::ReadyForPickup).unwrap();
        assert_eq!(json, r#""READY_FOR_PICKUP""#);
        let parsed: UpdateStatusRequest = serde_json::from_str(r#"{"status":"ACCEPTED"}"#).unwrap();
        assert_eq!(parsed.status, OrderStatus::Accepted);
    }

    #[test]
    fn test_create_order_request_parsing() {
        let body = r#"{
            "merchantId": "bakery-one",
            "slotId": "slot-1",
            "address": {"line1": "Damrak 1", "city": "Amsterdam"},
            "items": [{"productId": "p1", "qty": 2}, {"productId": "p1", "qty": 1}]
        }"#;
        let req: CreateOrderRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.merchant_id, "bakery-one");
        assert_eq!(req.items.len(), 2);
        assert!(req.instructions.is_none());
    }
}
