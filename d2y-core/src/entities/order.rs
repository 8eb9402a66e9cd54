use d2y_sdk::objects::{MoneyTotals, OrderItemResponse, OrderResponse, OrderSummaryResponse};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::access::Ownership;
use crate::entities::slot::SlotWindow;
use crate::entities::{OrderStatus, PaymentStatus};

/// Frozen money snapshot of an order.
///
/// Always satisfies `total_cents == subtotal_cents + delivery_fee_cents`
/// when built through [`Totals::from_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totals {
    pub currency: String,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    pub items_count: i64,
}

impl Totals {
    /// Price a list of `(unit_price_cents, qty)` lines.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn from_items(
        lines: impl IntoIterator<Item = (i64, i64)>,
        delivery_fee_cents: i64,
        currency: &str,
    ) -> Option<Totals> {
        let mut subtotal_cents: i64 = 0;
        let mut items_count: i64 = 0;
        for (unit_price_cents, qty) in lines {
            subtotal_cents = subtotal_cents.checked_add(unit_price_cents.checked_mul(qty)?)?;
            items_count = items_count.checked_add(qty)?;
        }
        Some(Totals {
            currency: currency.to_owned(),
            subtotal_cents,
            delivery_fee_cents,
            total_cents: subtotal_cents.checked_add(delivery_fee_cents)?,
            items_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_code: String,
    pub consumer_id: String,
    pub merchant_id: String,
    pub merchant_name: String,
    pub slot_id: String,
    pub slot: SlotWindow,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub totals: Totals,
    pub address: serde_json::Value,
    pub instructions: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn ownership(&self) -> Ownership<'_> {
        Ownership {
            consumer_id: &self.consumer_id,
            merchant_id: &self.merchant_id,
        }
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            order_code: self.order_code.clone(),
            consumer_id: self.consumer_id.clone(),
            merchant_id: self.merchant_id.clone(),
            merchant_name: self.merchant_name.clone(),
            slot_id: self.slot_id.clone(),
            slot: self.slot,
            status: self.status,
            payment_status: self.payment_status,
            totals: self.totals.clone(),
            created_at: self.created_at,
        }
    }
}

/// Order row as shown in lists (no items, no address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_code: String,
    pub consumer_id: String,
    pub merchant_id: String,
    pub merchant_name: String,
    pub slot_id: String,
    pub slot: SlotWindow,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub totals: Totals,
    pub created_at: OffsetDateTime,
}

/// Data for inserting a new order together with its items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_code: String,
    pub consumer_id: String,
    pub merchant_id: String,
    /// Display name at placement; not stored on the order row.
    pub merchant_name: String,
    pub slot_id: String,
    pub slot: SlotWindow,
    pub totals: Totals,
    pub address: serde_json::Value,
    pub instructions: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: OffsetDateTime,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    /// The order as it exists right after insertion.
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            order_code: self.order_code,
            consumer_id: self.consumer_id,
            merchant_id: self.merchant_id,
            merchant_name: self.merchant_name,
            slot_id: self.slot_id,
            slot: self.slot,
            status: OrderStatus::Placed,
            payment_status: PaymentStatus::Unpaid,
            totals: self.totals,
            address: self.address,
            instructions: self.instructions,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
            updated_at: self.created_at,
            items: self.items,
        }
    }
}

/// Which orders a list request may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Consumer(String),
    Merchant(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderListFilter {
    pub scope: OrderScope,
    /// Case-insensitive substring of the order code.
    pub code_search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// API conversions
// ---------------------------------------------------------------------------

impl From<&Totals> for MoneyTotals {
    fn from(t: &Totals) -> Self {
        MoneyTotals {
            currency: t.currency.clone(),
            subtotal_cents: t.subtotal_cents,
            delivery_fee_cents: t.delivery_fee_cents,
            total_cents: t.total_cents,
            items_count: t.items_count,
        }
    }
}

impl From<&OrderSummary> for OrderSummaryResponse {
    fn from(s: &OrderSummary) -> Self {
        OrderSummaryResponse {
            id: s.id,
            order_code: s.order_code.clone(),
            status: s.status.into(),
            payment_status: s.payment_status.into(),
            consumer_id: s.consumer_id.clone(),
            merchant_id: s.merchant_id.clone(),
            merchant_name: s.merchant_name.clone(),
            slot_id: s.slot_id.clone(),
            slot: (&s.slot).into(),
            totals: (&s.totals).into(),
            created_at: s.created_at,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        OrderResponse {
            summary: (&order.summary()).into(),
            address: order.address.clone(),
            instructions: order.instructions.clone(),
            updated_at: order.updated_at,
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id.clone(),
                    name_snapshot: item.name_snapshot.clone(),
                    unit_price_cents: item.unit_price_cents,
                    qty: item.qty,
                })
                .collect(),
        }
    }
}
