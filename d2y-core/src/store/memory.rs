//! In-process store.
//!
//! All state sits behind one async mutex. A transaction holds the lock for
//! its whole life and works on a private copy, which replaces the shared
//! state on commit and is thrown away otherwise. Waiting for the lock is
//! bounded by `lock_timeout`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use uuid::Uuid;

use super::{DuplicateKey, OrderStore, StoreError, StoreTransaction};
use crate::entities::catalog::{Merchant, Product};
use crate::entities::event::OrderEvent;
use crate::entities::order::{NewOrder, Order, OrderListFilter, OrderScope, OrderSummary};
use crate::entities::refund::Refund;
use crate::entities::slot::{Slot, SlotQuery};
use crate::entities::{OrderStatus, PaymentStatus};
use crate::ledger::SlotReservation;

/// Catalog and capacity fixtures a [`MemoryStore`] starts with.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub merchants: Vec<Merchant>,
    pub products: Vec<Product>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default)]
struct State {
    merchants: HashMap<String, Merchant>,
    products: HashMap<String, Product>,
    slots: HashMap<String, Slot>,
    orders: HashMap<Uuid, Order>,
    events: Vec<OrderEvent>,
    refunds: Vec<Refund>,
}

impl State {
    fn by_idempotency_key(&self, consumer_id: &str, key: &str) -> Option<Order> {
        self.orders
            .values()
            .find(|o| o.consumer_id == consumer_id && o.idempotency_key.as_deref() == Some(key))
            .cloned()
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    lock_timeout: Duration,
}

impl MemoryStore {
    pub fn seeded(seed: Seed, lock_timeout: Duration) -> Self {
        let state = State {
            merchants: seed
                .merchants
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            products: seed
                .products
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            slots: seed.slots.into_iter().map(|s| (s.id.clone(), s)).collect(),
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            lock_timeout,
        }
    }

    async fn read(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| StoreError::Timeout)?;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, work }))
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.read().await?.orders.get(&id).cloned())
    }

    async fn find_order_by_idempotency_key(
        &self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self.read().await?.by_idempotency_key(consumer_id, key))
    }

    async fn list_orders(&self, filter: &OrderListFilter) -> Result<Vec<OrderSummary>, StoreError> {
        let state = self.read().await?;
        let needle = filter.code_search.as_deref().map(str::to_lowercase);
        let mut orders: Vec<&Order> = state
            .orders
            .values()
            .filter(|o| match &filter.scope {
                OrderScope::All => true,
                OrderScope::Consumer(id) => &o.consumer_id == id,
                OrderScope::Merchant(id) => &o.merchant_id == id,
            })
            .filter(|o| {
                needle
                    .as_deref()
                    .is_none_or(|n| o.order_code.to_lowercase().contains(n))
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        Ok(orders
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(Order::summary)
            .collect())
    }

    async fn list_events(&self, order_id: Uuid) -> Result<Vec<OrderEvent>, StoreError> {
        let state = self.read().await?;
        let mut events: Vec<OrderEvent> = state
            .events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn find_slot(&self, id: &str) -> Result<Option<Slot>, StoreError> {
        Ok(self.read().await?.slots.get(id).cloned())
    }

    async fn list_slots(&self, query: &SlotQuery) -> Result<Vec<Slot>, StoreError> {
        let state = self.read().await?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.date == query.date && s.slot_type == query.slot_type)
            .filter(|s| !query.only_available || s.is_available())
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(slots)
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    work: State,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_order_by_idempotency_key(
        &mut self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self.work.by_idempotency_key(consumer_id, key))
    }

    async fn find_merchant(&mut self, id: &str) -> Result<Option<Merchant>, StoreError> {
        Ok(self.work.merchants.get(id).cloned())
    }

    async fn reserve_slot(&mut self, slot_id: &str) -> Result<SlotReservation, StoreError> {
        let Some(slot) = self.work.slots.get_mut(slot_id) else {
            return Ok(SlotReservation::NotFound);
        };
        if slot.remaining <= 0 {
            return Ok(SlotReservation::Full);
        }
        slot.remaining -= 1;
        Ok(SlotReservation::Reserved(slot.clone()))
    }

    async fn find_products(
        &mut self,
        merchant_id: &str,
        ids: &[String],
    ) -> Result<Vec<Product>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.products.get(id))
            .filter(|p| p.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn order_code_taken(&mut self, code: &str) -> Result<bool, StoreError> {
        Ok(self.work.orders.values().any(|o| o.order_code == code))
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), StoreError> {
        if self.work.orders.values().any(|o| o.order_code == order.order_code) {
            return Err(StoreError::Duplicate(DuplicateKey::OrderCode));
        }
        if let Some(key) = order.idempotency_key.as_deref()
            && self
                .work
                .by_idempotency_key(&order.consumer_id, key)
                .is_some()
        {
            return Err(StoreError::Duplicate(DuplicateKey::IdempotencyKey));
        }
        self.work.orders.insert(order.id, order.clone().into_order());
        Ok(())
    }

    async fn lock_order(&mut self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn update_order_state(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let order = self.work.orders.get_mut(&id).ok_or(StoreError::Missing)?;
        order.status = status;
        order.payment_status = payment_status;
        order.updated_at = updated_at;
        Ok(())
    }

    async fn append_event(&mut self, event: &OrderEvent) -> Result<(), StoreError> {
        if !self.work.orders.contains_key(&event.order_id) {
            return Err(StoreError::Missing);
        }
        self.work.events.push(event.clone());
        Ok(())
    }

    async fn insert_refund(&mut self, refund: &Refund) -> Result<(), StoreError> {
        if self.work.refunds.iter().any(|r| r.order_id == refund.order_id) {
            return Err(StoreError::Duplicate(DuplicateKey::Refund));
        }
        self.work.refunds.push(refund.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
