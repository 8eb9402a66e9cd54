//! Live channel message types.
//!
//! The `GET /ws` endpoint upgrades to a WebSocket connection that carries
//! lifecycle notifications for every group the caller belongs to.
//!
//! # Protocol
//!
//! 1. The server sends [`ServerMessage::Connected`] with the resolved caller
//!    right after the upgrade.
//! 2. The server sends [`ServerMessage::Event`] frames for every lifecycle
//!    event published to one of the caller's groups.
//! 3. The client may send [`ClientMessage::OrderSubscribe`] to join a single
//!    order's group; the server answers with [`ServerMessage::SubscribeResult`].
//!
//! Delivery is best effort. A client that was offline (or too slow) reads
//! the current state over the regular HTTP endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CallerInfo;
use super::error::ErrorCode;
use super::order::{OrderEventResponse, OrderResponse, RefundResponse};

/// A lifecycle notification, tagged by its event name.
///
/// ```json
/// {"event":"order.updated","payload":{ ... }}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum LiveEvent {
    #[serde(rename = "order.created")]
    OrderCreated(OrderResponse),
    #[serde(rename = "order.updated")]
    OrderUpdated(OrderResponse),
    #[serde(rename = "order.event.created")]
    OrderEventCreated(OrderEventResponse),
    #[serde(rename = "refund.created")]
    RefundCreated(RefundResponse),
}

impl LiveEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::OrderCreated(_) => "order.created",
            LiveEvent::OrderUpdated(_) => "order.updated",
            LiveEvent::OrderEventCreated(_) => "order.event.created",
            LiveEvent::RefundCreated(_) => "refund.created",
        }
    }
}

/// Server-to-client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user: CallerInfo,
    },
    Event(LiveEvent),
    SubscribeResult {
        #[serde(rename = "orderId")]
        order_id: Uuid,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorCode>,
    },
}

/// Client-to-server frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "order.subscribe")]
    OrderSubscribe {
        #[serde(rename = "orderId")]
        order_id: Uuid,
    },
}
