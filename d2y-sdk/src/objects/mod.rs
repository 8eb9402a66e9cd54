pub mod error;
pub mod live;
pub mod order;
pub mod slot;

pub use error::{ErrorBody, ErrorCode};
pub use live::{ClientMessage, LiveEvent, ServerMessage};
pub use order::{
    CreateOrderItem, CreateOrderRequest, ListOrdersQuery, MoneyTotals, OrderEventResponse,
    OrderItemResponse, OrderPageResponse, OrderResponse, OrderStatus, OrderSummaryResponse,
    PaymentStatus, RefundOutcome, RefundRequest, RefundResponse, UpdateStatusRequest,
    clamp_pagination,
};
pub use slot::{ListSlotsQuery, SlotResponse, SlotType, SlotWindowResponse};

use serde::{Deserialize, Serialize};

/// Caller role as carried on the wire.
///
/// The core models merchant affiliation inside the role; on the wire the
/// affiliation travels next to it in [`CallerInfo::merchant_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Consumer,
    Merchant,
    Admin,
    Support,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Consumer => write!(f, "CONSUMER"),
            Role::Merchant => write!(f, "MERCHANT"),
            Role::Admin => write!(f, "ADMIN"),
            Role::Support => write!(f, "SUPPORT"),
        }
    }
}

/// The resolved identity of a caller, echoed back on live-channel connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerInfo {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
}
