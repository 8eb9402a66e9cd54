pub mod catalog;
pub mod event;
pub mod order;
pub mod refund;
pub mod slot;

use d2y_sdk::objects::{
    OrderStatus as SdkOrderStatus, PaymentStatus as SdkPaymentStatus, SlotType as SdkSlotType,
};

/// Order fulfilment status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `d2y_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE", type_name = "order_status")]
pub enum OrderStatus {
    Placed,
    Paid,
    Accepted,
    Packing,
    ReadyForPickup,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Forward steps a merchant's staff may take from this status.
    ///
    /// Admin-like callers are not bound by this table.
    pub fn merchant_next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Paid => &[OrderStatus::Accepted],
            OrderStatus::Accepted => &[OrderStatus::Packing],
            OrderStatus::Packing => &[OrderStatus::ReadyForPickup],
            OrderStatus::Placed
            | OrderStatus::ReadyForPickup
            | OrderStatus::Cancelled
            | OrderStatus::Refunded => &[],
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&SdkOrderStatus::from(*self), f)
    }
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Placed => SdkOrderStatus::Placed,
            OrderStatus::Paid => SdkOrderStatus::Paid,
            OrderStatus::Accepted => SdkOrderStatus::Accepted,
            OrderStatus::Packing => SdkOrderStatus::Packing,
            OrderStatus::ReadyForPickup => SdkOrderStatus::ReadyForPickup,
            OrderStatus::Cancelled => SdkOrderStatus::Cancelled,
            OrderStatus::Refunded => SdkOrderStatus::Refunded,
        }
    }
}

impl From<SdkOrderStatus> for OrderStatus {
    fn from(value: SdkOrderStatus) -> Self {
        match value {
            SdkOrderStatus::Placed => OrderStatus::Placed,
            SdkOrderStatus::Paid => OrderStatus::Paid,
            SdkOrderStatus::Accepted => OrderStatus::Accepted,
            SdkOrderStatus::Packing => OrderStatus::Packing,
            SdkOrderStatus::ReadyForPickup => OrderStatus::ReadyForPickup,
            SdkOrderStatus::Cancelled => OrderStatus::Cancelled,
            SdkOrderStatus::Refunded => OrderStatus::Refunded,
        }
    }
}

/// Payment status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `d2y_sdk::objects::PaymentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE", type_name = "payment_status")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&SdkPaymentStatus::from(*self), f)
    }
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Unpaid => SdkPaymentStatus::Unpaid,
            PaymentStatus::Paid => SdkPaymentStatus::Paid,
            PaymentStatus::Refunded => SdkPaymentStatus::Refunded,
        }
    }
}

/// Slot type for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `d2y_sdk::objects::SlotType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE", type_name = "slot_type")]
pub enum SlotType {
    Delivery,
    Cnc,
}

impl From<SlotType> for SdkSlotType {
    fn from(value: SlotType) -> Self {
        match value {
            SlotType::Delivery => SdkSlotType::Delivery,
            SlotType::Cnc => SdkSlotType::Cnc,
        }
    }
}

impl From<SdkSlotType> for SlotType {
    fn from(value: SdkSlotType) -> Self {
        match value {
            SdkSlotType::Delivery => SlotType::Delivery,
            SdkSlotType::Cnc => SlotType::Cnc,
        }
    }
}
