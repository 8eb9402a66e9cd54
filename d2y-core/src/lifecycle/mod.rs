//! Order Lifecycle Engine.
//!
//! ```text
//! PLACED -> PAID -> ACCEPTED -> PACKING -> READY_FOR_PICKUP
//!    \________\________\__________\----> CANCELLED / REFUNDED
//! ```
//!
//! Every mutating operation follows the same shape: authorize, open a store
//! transaction, lock or create the order, apply the change together with an
//! appended [`OrderEvent`](crate::entities::event::OrderEvent), commit, and
//! only then publish to the [`FanoutHub`].

pub mod code;
mod create;
mod error;
mod query;
mod refund;
mod transition;

use std::sync::Arc;

use d2y_sdk::objects::{LiveEvent, OrderEventResponse, OrderResponse};
use tokio::sync::RwLock;

use crate::entities::event::OrderEvent;
use crate::entities::order::Order;
use crate::events::{FanoutHub, Group};
use crate::store::OrderStore;

pub use code::{OrderCodeGenerator, RandomOrderCode};
pub use create::{CreateOrder, CreateOutcome, OrderLine};
pub use error::{OrderError, Resource};
pub use query::OrderPage;
pub use refund::{RefundOrder, RefundResult};

/// Tunables that may change at runtime (SIGHUP reload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSettings {
    pub currency: String,
    /// Charged on `DELIVERY` slots only.
    pub delivery_fee_cents: i64,
    pub order_code_attempts: u32,
    /// Page size when the caller does not ask for one.
    pub list_limit: i64,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            currency: "EUR".to_owned(),
            delivery_fee_cents: 0,
            order_code_attempts: 5,
            list_limit: 50,
        }
    }
}

#[derive(Clone)]
pub struct OrderEngine {
    store: Arc<dyn OrderStore>,
    hub: FanoutHub,
    settings: Arc<RwLock<OrderSettings>>,
    codes: Arc<dyn OrderCodeGenerator>,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn OrderStore>, hub: FanoutHub, settings: OrderSettings) -> Self {
        Self {
            store,
            hub,
            settings: Arc::new(RwLock::new(settings)),
            codes: Arc::new(RandomOrderCode),
        }
    }

    pub fn with_code_generator(mut self, codes: impl OrderCodeGenerator + 'static) -> Self {
        self.codes = Arc::new(codes);
        self
    }

    pub fn hub(&self) -> &FanoutHub {
        &self.hub
    }

    pub async fn settings(&self) -> OrderSettings {
        self.settings.read().await.clone()
    }

    pub async fn replace_settings(&self, settings: OrderSettings) {
        *self.settings.write().await = settings;
    }

    /// Broadcast a committed change of an existing order.
    fn announce_update(&self, order: &Order, event: &OrderEvent) {
        let audience = order_audience(order);
        self.hub
            .publish(&audience, LiveEvent::OrderUpdated(OrderResponse::from(order)));
        self.hub.publish(
            &audience,
            LiveEvent::OrderEventCreated(OrderEventResponse::from(event)),
        );
    }
}

/// Everyone who follows an existing order.
pub(crate) fn order_audience(order: &Order) -> [Group; 3] {
    [
        Group::Admin,
        Group::Merchant(order.merchant_id.clone()),
        Group::Order(order.id),
    ]
}
