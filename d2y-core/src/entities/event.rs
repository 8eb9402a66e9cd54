//! Append-only order audit trail.
//!
//! Events are written in the same transaction as the state change they
//! describe and are never updated or deleted afterwards. Every realtime
//! notification is derived from one of these records.

use d2y_sdk::objects::OrderEventResponse;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE", type_name = "order_event_type")]
pub enum OrderEventType {
    OrderCreated,
    PaymentPaid,
    StatusChanged,
    RefundCreated,
}

impl OrderEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderEventType::OrderCreated => "ORDER_CREATED",
            OrderEventType::PaymentPaid => "PAYMENT_PAID",
            OrderEventType::StatusChanged => "STATUS_CHANGED",
            OrderEventType::RefundCreated => "REFUND_CREATED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrderEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub event_type: OrderEventType,
    pub payload: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub actor_user_id: Option<String>,
}

/// Data for appending an event.
#[derive(Debug, Clone)]
pub struct NewOrderEvent {
    pub order_id: Uuid,
    pub event_type: OrderEventType,
    pub payload: serde_json::Value,
    pub actor_user_id: Option<String>,
}

impl NewOrderEvent {
    /// Stamp the event with an id and creation time.
    pub fn into_event(self) -> OrderEvent {
        OrderEvent {
            id: Uuid::now_v7(),
            order_id: self.order_id,
            event_type: self.event_type,
            payload: self.payload,
            created_at: OffsetDateTime::now_utc(),
            actor_user_id: self.actor_user_id,
        }
    }
}

impl From<&OrderEvent> for OrderEventResponse {
    fn from(e: &OrderEvent) -> Self {
        OrderEventResponse {
            id: e.id,
            order_id: e.order_id,
            event_type: e.event_type.as_str().to_owned(),
            payload: e.payload.clone(),
            created_at: e.created_at,
            actor_user_id: e.actor_user_id.clone(),
        }
    }
}
