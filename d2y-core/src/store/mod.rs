//! Order Store abstraction.
//!
//! [`OrderStore`] serves single-statement reads. Anything that must be
//! atomic goes through a [`StoreTransaction`] obtained from
//! [`OrderStore::begin`]: reads and writes happen on the transaction and
//! become visible only after [`StoreTransaction::commit`]. Dropping a
//! transaction without committing discards every change it made, the slot
//! reservation included.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::catalog::{Merchant, Product};
use crate::entities::event::OrderEvent;
use crate::entities::order::{NewOrder, Order, OrderListFilter, OrderSummary};
use crate::entities::refund::Refund;
use crate::entities::slot::{Slot, SlotQuery};
use crate::entities::{OrderStatus, PaymentStatus};
use crate::ledger::SlotReservation;

pub use memory::{MemoryStore, Seed};
pub use postgres::PgStore;

/// Unique constraints the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    OrderCode,
    IdempotencyKey,
    Refund,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("storage operation timed out")]
    Timeout,
    #[error("duplicate {0:?}")]
    Duplicate(DuplicateKey),
    #[error("row disappeared inside the transaction")]
    Missing,
}

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_QUERY_CANCELED: &str = "57014";

fn classify(err: &sqlx::Error) -> Option<StoreError> {
    match err {
        sqlx::Error::PoolTimedOut => Some(StoreError::Timeout),
        sqlx::Error::Database(db) => {
            let code = db.code();
            match code.as_deref() {
                Some(PG_QUERY_CANCELED) => Some(StoreError::Timeout),
                Some(PG_UNIQUE_VIOLATION) => match db.constraint() {
                    Some(postgres::ORDER_CODE_CONSTRAINT) => {
                        Some(StoreError::Duplicate(DuplicateKey::OrderCode))
                    }
                    Some(postgres::IDEMPOTENCY_CONSTRAINT) => {
                        Some(StoreError::Duplicate(DuplicateKey::IdempotencyKey))
                    }
                    Some(postgres::REFUND_CONSTRAINT) => {
                        Some(StoreError::Duplicate(DuplicateKey::Refund))
                    }
                    _ => None,
                },
                _ => None,
            }
        }
        _ => None,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        classify(&err).unwrap_or(StoreError::Database(err))
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_order_by_idempotency_key(
        &self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Newest first.
    async fn list_orders(&self, filter: &OrderListFilter) -> Result<Vec<OrderSummary>, StoreError>;

    /// Oldest first.
    async fn list_events(&self, order_id: Uuid) -> Result<Vec<OrderEvent>, StoreError>;

    async fn find_slot(&self, id: &str) -> Result<Option<Slot>, StoreError>;

    /// Ordered by start time.
    async fn list_slots(&self, query: &SlotQuery) -> Result<Vec<Slot>, StoreError>;
}

#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_order_by_idempotency_key(
        &mut self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError>;

    async fn find_merchant(&mut self, id: &str) -> Result<Option<Merchant>, StoreError>;

    /// Take one unit of capacity if any is left.
    ///
    /// Check and decrement happen as one indivisible step.
    async fn reserve_slot(&mut self, slot_id: &str) -> Result<SlotReservation, StoreError>;

    /// Products of `merchant_id` among `ids`. Missing ids are simply absent.
    async fn find_products(
        &mut self,
        merchant_id: &str,
        ids: &[String],
    ) -> Result<Vec<Product>, StoreError>;

    async fn order_code_taken(&mut self, code: &str) -> Result<bool, StoreError>;

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), StoreError>;

    /// Load an order and hold it against concurrent writers until the
    /// transaction ends.
    async fn lock_order(&mut self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn update_order_state(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    async fn append_event(&mut self, event: &OrderEvent) -> Result<(), StoreError>;

    async fn insert_refund(&mut self, refund: &Refund) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
