use std::collections::HashMap;

use d2y_sdk::objects::{CreateOrderRequest, LiveEvent, OrderEventResponse, OrderResponse};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{OrderEngine, OrderError, Resource};
use crate::access::{self, Action};
use crate::entities::event::{NewOrderEvent, OrderEventType};
use crate::entities::order::{NewOrder, Order, OrderItem, Totals};
use crate::entities::{OrderStatus, SlotType};
use crate::events::Group;
use crate::identity::Caller;
use crate::ledger;
use crate::store::{DuplicateKey, StoreError, StoreTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub qty: i64,
}

/// Input of [`OrderEngine::create_order`].
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub merchant_id: String,
    pub slot_id: String,
    pub address: serde_json::Value,
    pub instructions: Option<String>,
    pub items: Vec<OrderLine>,
    /// Raw token as received; trimmed, and ignored when blank.
    pub idempotency_key: Option<String>,
}

impl CreateOrder {
    pub fn from_request(request: CreateOrderRequest, idempotency_key: Option<String>) -> Self {
        Self {
            merchant_id: request.merchant_id,
            slot_id: request.slot_id,
            address: request.address,
            instructions: request.instructions,
            items: request
                .items
                .into_iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    qty: item.qty,
                })
                .collect(),
            idempotency_key,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Order),
    /// An order with the same idempotency token already existed.
    Replayed(Order),
}

impl CreateOutcome {
    pub fn order(&self) -> &Order {
        match self {
            CreateOutcome::Created(order) | CreateOutcome::Replayed(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            CreateOutcome::Created(order) | CreateOutcome::Replayed(order) => order,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, CreateOutcome::Replayed(_))
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty())
}

/// Merge repeated products, summing quantities and keeping the position of
/// the first appearance.
pub(crate) fn merge_lines(items: Vec<OrderLine>) -> Result<Vec<OrderLine>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::InvalidInput("order has no items".into()));
    }
    let mut merged: Vec<OrderLine> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in items {
        if line.qty < 1 {
            return Err(OrderError::InvalidInput(format!(
                "quantity of {} must be at least 1",
                line.product_id
            )));
        }
        if line.product_id.trim().is_empty() {
            return Err(OrderError::InvalidInput("empty product id".into()));
        }
        match index.get(&line.product_id) {
            Some(&i) => {
                merged[i].qty = merged[i]
                    .qty
                    .checked_add(line.qty)
                    .ok_or_else(|| OrderError::InvalidInput("quantity out of range".into()))?;
            }
            None => {
                index.insert(line.product_id.clone(), merged.len());
                merged.push(line);
            }
        }
    }
    Ok(merged)
}

impl OrderEngine {
    /// Place an order, or replay the one already placed with the same token.
    ///
    /// Slot reservation, pricing, code allocation and persistence form one
    /// transaction; any failure leaves no trace, including the slot unit.
    #[tracing::instrument(skip_all, fields(consumer = %caller.user_id, slot_id = %input.slot_id))]
    pub async fn create_order(
        &self,
        caller: &Caller,
        input: CreateOrder,
    ) -> Result<CreateOutcome, OrderError> {
        access::authorize(caller, Action::Create, None)?;

        if !input.address.is_object() {
            return Err(OrderError::InvalidInput(
                "address must be a JSON object".into(),
            ));
        }
        let key = normalize_key(input.idempotency_key.clone());
        let lines = merge_lines(input.items.clone())?;

        let mut tx = self.store.begin().await?;

        if let Some(key) = key.as_deref()
            && let Some(existing) = tx
                .find_order_by_idempotency_key(&caller.user_id, key)
                .await?
        {
            tx.rollback().await?;
            tracing::info!(order_id = %existing.id, "idempotent replay");
            return Ok(CreateOutcome::Replayed(existing));
        }

        let new_order = self
            .place_in_tx(&mut *tx, caller, &input, lines, key.clone())
            .await?;
        let event = NewOrderEvent {
            order_id: new_order.id,
            event_type: OrderEventType::OrderCreated,
            payload: json!({ "status": OrderStatus::Placed.to_string() }),
            actor_user_id: Some(caller.user_id.clone()),
        }
        .into_event();

        match tx.insert_order(&new_order).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(DuplicateKey::IdempotencyKey)) => {
                drop(tx);
                return self.replay_after_race(caller, key.as_deref()).await;
            }
            Err(e) => return Err(e.into()),
        }
        tx.append_event(&event).await?;
        tx.commit().await?;

        let order = new_order.into_order();
        tracing::info!(
            order_id = %order.id,
            order_code = %order.order_code,
            total_cents = order.totals.total_cents,
            "order created"
        );

        let audience = [Group::Admin, Group::Merchant(order.merchant_id.clone())];
        self.hub
            .publish(&audience, LiveEvent::OrderCreated(OrderResponse::from(&order)));
        self.hub.publish(
            &audience,
            LiveEvent::OrderEventCreated(OrderEventResponse::from(&event)),
        );
        Ok(CreateOutcome::Created(order))
    }

    /// Merchant check, slot reservation, pricing and code allocation.
    async fn place_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        caller: &Caller,
        input: &CreateOrder,
        lines: Vec<OrderLine>,
        idempotency_key: Option<String>,
    ) -> Result<NewOrder, OrderError> {
        let settings = self.settings().await;

        let merchant = match tx.find_merchant(&input.merchant_id).await? {
            Some(merchant) if merchant.active => merchant,
            _ => return Err(OrderError::NotFound(Resource::Merchant)),
        };

        let slot = ledger::reserve(tx, &input.slot_id).await?;

        let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        let products: HashMap<String, _> = tx
            .find_products(&input.merchant_id, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products
                .get(&line.product_id)
                .ok_or(OrderError::NotFound(Resource::Product))?;
            items.push((product, line.qty));
        }
        if let Some((product, _)) = items.iter().find(|(p, _)| !p.in_stock) {
            return Err(OrderError::InvalidInput(format!(
                "product {} is out of stock",
                product.id
            )));
        }

        let delivery_fee_cents = match slot.slot_type {
            SlotType::Delivery => settings.delivery_fee_cents,
            SlotType::Cnc => 0,
        };
        let totals = Totals::from_items(
            items.iter().map(|(p, qty)| (p.price_cents, *qty)),
            delivery_fee_cents,
            &settings.currency,
        )
        .ok_or_else(|| OrderError::InvalidInput("order total out of range".into()))?;

        let order_code = self.allocate_code(tx, settings.order_code_attempts).await?;

        Ok(NewOrder {
            id: Uuid::now_v7(),
            order_code,
            consumer_id: caller.user_id.clone(),
            merchant_id: merchant.id,
            merchant_name: merchant.name,
            slot: slot.window(),
            slot_id: slot.id,
            totals,
            address: input.address.clone(),
            instructions: input
                .instructions
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            idempotency_key,
            created_at: OffsetDateTime::now_utc(),
            items: items
                .into_iter()
                .map(|(product, qty)| OrderItem {
                    id: Uuid::now_v7(),
                    product_id: product.id.clone(),
                    name_snapshot: product.name.clone(),
                    unit_price_cents: product.price_cents,
                    qty,
                })
                .collect(),
        })
    }

    async fn allocate_code(
        &self,
        tx: &mut dyn StoreTransaction,
        attempts: u32,
    ) -> Result<String, OrderError> {
        for _ in 0..attempts {
            let candidate = self.codes.generate();
            if !tx.order_code_taken(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(code = %candidate, "order code collision");
        }
        Err(OrderError::Conflict("could not allocate a unique order code"))
    }

    /// A concurrent request with the same token won the insert; hand back
    /// its order.
    async fn replay_after_race(
        &self,
        caller: &Caller,
        key: Option<&str>,
    ) -> Result<CreateOutcome, OrderError> {
        let Some(key) = key else {
            return Err(OrderError::Conflict("duplicate idempotency key"));
        };
        match self
            .store
            .find_order_by_idempotency_key(&caller.user_id, key)
            .await?
        {
            Some(order) => {
                tracing::info!(order_id = %order.id, "idempotent replay after concurrent insert");
                Ok(CreateOutcome::Replayed(order))
            }
            None => Err(OrderError::Conflict("duplicate idempotency key")),
        }
    }
}
