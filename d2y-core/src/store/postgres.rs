//! PostgreSQL store.
//!
//! Reads run as [`Processor`] queries on a [`DatabaseProcessor`]; every
//! step of a business transaction is a `*_tx` function on the open
//! [`sqlx::Transaction`].

use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::{PgExecutor, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{OrderStore, StoreError, StoreTransaction};
use crate::entities::catalog::{Merchant, Product};
use crate::entities::event::OrderEvent;
use crate::entities::order::{
    NewOrder, Order, OrderItem, OrderListFilter, OrderScope, OrderSummary, Totals,
};
use crate::entities::refund::Refund;
use crate::entities::slot::{Slot, SlotQuery, SlotWindow};
use crate::entities::{OrderStatus, PaymentStatus, SlotType};
use crate::framework::{DatabaseProcessor, TransactionProcessor};
use crate::ledger::SlotReservation;

pub(crate) const ORDER_CODE_CONSTRAINT: &str = "orders_order_code_key";
pub(crate) const IDEMPOTENCY_CONSTRAINT: &str = "orders_consumer_idempotency_key";
pub(crate) const REFUND_CONSTRAINT: &str = "refunds_order_id_key";

/// Order row joined with its merchant's name and its slot's window.
const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_code, o.consumer_id, o.merchant_id, m.name AS merchant_name,
        o.slot_id, s."date" AS slot_date, s.slot_type, s.start_time AS slot_start_time,
        s.end_time AS slot_end_time, o.status, o.payment_status, o.currency,
        o.subtotal_cents, o.delivery_fee_cents, o.total_cents, o.items_count,
        o.address, o.instructions, o.idempotency_key, o.created_at, o.updated_at
    FROM orders o
    JOIN merchants m ON m.id = o.merchant_id
    JOIN slots s ON s.id = o.slot_id
"#;

const SLOT_COLUMNS: &str =
    r#"id, "date", slot_type, start_time, end_time, capacity, remaining"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_code: String,
    consumer_id: String,
    merchant_id: String,
    merchant_name: String,
    slot_id: String,
    slot_date: time::Date,
    slot_type: SlotType,
    slot_start_time: time::Time,
    slot_end_time: time::Time,
    status: OrderStatus,
    payment_status: PaymentStatus,
    currency: String,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    total_cents: i64,
    items_count: i64,
    address: serde_json::Value,
    instructions: Option<String>,
    idempotency_key: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl OrderRow {
    fn totals(&self) -> Totals {
        Totals {
            currency: self.currency.clone(),
            subtotal_cents: self.subtotal_cents,
            delivery_fee_cents: self.delivery_fee_cents,
            total_cents: self.total_cents,
            items_count: self.items_count,
        }
    }

    fn slot(&self) -> SlotWindow {
        SlotWindow {
            date: self.slot_date,
            slot_type: self.slot_type,
            start_time: self.slot_start_time,
            end_time: self.slot_end_time,
        }
    }

    fn into_summary(self) -> OrderSummary {
        OrderSummary {
            totals: self.totals(),
            slot: self.slot(),
            id: self.id,
            order_code: self.order_code,
            consumer_id: self.consumer_id,
            merchant_id: self.merchant_id,
            merchant_name: self.merchant_name,
            slot_id: self.slot_id,
            status: self.status,
            payment_status: self.payment_status,
            created_at: self.created_at,
        }
    }

    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            totals: self.totals(),
            slot: self.slot(),
            id: self.id,
            order_code: self.order_code,
            consumer_id: self.consumer_id,
            merchant_id: self.merchant_id,
            merchant_name: self.merchant_name,
            slot_id: self.slot_id,
            status: self.status,
            payment_status: self.payment_status,
            address: self.address,
            instructions: self.instructions,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

async fn load_items<'e>(
    executor: impl PgExecutor<'e>,
    order_id: Uuid,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, product_id, name_snapshot, unit_price_cents, qty
        FROM order_items
        WHERE order_id = $1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub id: Uuid,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(query.id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let items = load_items(&self.pool, row.id).await?;
                Ok(Some(row.into_order(items)))
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetOrderByIdempotencyKey {
    pub consumer_id: String,
    pub key: String,
}

impl Processor<GetOrderByIdempotencyKey> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByIdempotencyKey")]
    async fn process(&self, query: GetOrderByIdempotencyKey) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.consumer_id = $1 AND o.idempotency_key = $2"
        ))
        .bind(&query.consumer_id)
        .bind(&query.key)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => {
                let items = load_items(&self.pool, row.id).await?;
                Ok(Some(row.into_order(items)))
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
/// Page through orders visible in a scope, newest first.
pub struct ListOrders {
    pub filter: OrderListFilter,
}

impl Processor<ListOrders> for DatabaseProcessor {
    type Output = Vec<OrderSummary>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrders")]
    async fn process(&self, query: ListOrders) -> Result<Vec<OrderSummary>, sqlx::Error> {
        let filter = query.filter;
        let (consumer_id, merchant_id) = match filter.scope {
            OrderScope::All => (None, None),
            OrderScope::Consumer(id) => (Some(id), None),
            OrderScope::Merchant(id) => (None, Some(id)),
        };
        let pattern = filter.code_search.as_deref().map(like_pattern);
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            {ORDER_SELECT}
            WHERE ($1::text IS NULL OR o.consumer_id = $1)
              AND ($2::text IS NULL OR o.merchant_id = $2)
              AND ($3::text IS NULL OR o.order_code ILIKE $3 ESCAPE '\')
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(consumer_id)
        .bind(merchant_id)
        .bind(pattern)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderRow::into_summary).collect())
    }
}

#[derive(Debug, Clone)]
pub struct ListOrderEvents {
    pub order_id: Uuid,
}

impl Processor<ListOrderEvents> for DatabaseProcessor {
    type Output = Vec<OrderEvent>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrderEvents")]
    async fn process(&self, query: ListOrderEvents) -> Result<Vec<OrderEvent>, sqlx::Error> {
        sqlx::query_as::<_, OrderEvent>(
            r#"
            SELECT id, order_id, event_type, payload, created_at, actor_user_id
            FROM order_events
            WHERE order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(query.order_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetSlotById {
    pub id: String,
}

impl Processor<GetSlotById> for DatabaseProcessor {
    type Output = Option<Slot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSlotById")]
    async fn process(&self, query: GetSlotById) -> Result<Option<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(&format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1"))
            .bind(&query.id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct ListSlots {
    pub query: SlotQuery,
}

impl Processor<ListSlots> for DatabaseProcessor {
    type Output = Vec<Slot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListSlots")]
    async fn process(&self, query: ListSlots) -> Result<Vec<Slot>, sqlx::Error> {
        let query = query.query;
        sqlx::query_as::<_, Slot>(&format!(
            r#"
            SELECT {SLOT_COLUMNS}
            FROM slots
            WHERE "date" = $1 AND slot_type = $2 AND (NOT $3 OR remaining > 0)
            ORDER BY start_time, id
            "#
        ))
        .bind(query.date)
        .bind(query.slot_type)
        .bind(query.only_available)
        .fetch_all(&self.pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Transaction steps
// ---------------------------------------------------------------------------

impl Order {
    #[tracing::instrument(skip_all, err, name = "SQL:FindOrderByIdempotencyKeyTx")]
    pub async fn find_by_idempotency_key_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.consumer_id = $1 AND o.idempotency_key = $2"
        ))
        .bind(consumer_id)
        .bind(key)
        .fetch_optional(&mut **tx)
        .await?;
        match row {
            Some(row) => {
                let items = load_items(&mut **tx, row.id).await?;
                Ok(Some(row.into_order(items)))
            }
            None => Ok(None),
        }
    }

    /// Load an order with `FOR UPDATE`, blocking other writers until the
    /// transaction ends.
    #[tracing::instrument(skip_all, err, name = "SQL:LockOrderTx")]
    pub async fn lock_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 FOR UPDATE OF o"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        match row {
            Some(row) => {
                let items = load_items(&mut **tx, row.id).await?;
                Ok(Some(row.into_order(items)))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, err, name = "SQL:OrderCodeTakenTx")]
    pub async fn code_taken_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE order_code = $1)",
        )
        .bind(code)
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert the order row and its items.
    #[tracing::instrument(skip_all, err, name = "SQL:InsertOrderTx")]
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_code, consumer_id, merchant_id, slot_id, status, payment_status,
                currency, subtotal_cents, delivery_fee_cents, total_cents, items_count,
                address, instructions, idempotency_key, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_code)
        .bind(&order.consumer_id)
        .bind(&order.merchant_id)
        .bind(&order.slot_id)
        .bind(OrderStatus::Placed)
        .bind(PaymentStatus::Unpaid)
        .bind(&order.totals.currency)
        .bind(order.totals.subtotal_cents)
        .bind(order.totals.delivery_fee_cents)
        .bind(order.totals.total_cents)
        .bind(order.totals.items_count)
        .bind(&order.address)
        .bind(&order.instructions)
        .bind(&order.idempotency_key)
        .bind(order.created_at)
        .execute(&mut **tx)
        .await?;

        if order.items.is_empty() {
            return Ok(());
        }

        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO order_items \
            (id, order_id, position, product_id, name_snapshot, unit_price_cents, qty) ",
        );
        query_builder.push_values(order.items.iter().zip(0i32..), |mut b, (item, position)| {
            b.push_bind(item.id)
                .push_bind(order.id)
                .push_bind(position)
                .push_bind(&item.product_id)
                .push_bind(&item.name_snapshot)
                .push_bind(item.unit_price_cents)
                .push_bind(item.qty);
        });
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Returns the number of rows touched (0 or 1).
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateOrderStateTx")]
    pub async fn update_state_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .bind(updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

impl Slot {
    /// Conditional decrement. `None` when nothing was decremented.
    #[tracing::instrument(skip_all, err, name = "SQL:ReserveSlotTx")]
    pub async fn reserve_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        slot_id: &str,
    ) -> Result<Option<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(&format!(
            r#"
            UPDATE slots
            SET remaining = remaining - 1
            WHERE id = $1 AND remaining > 0
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .fetch_optional(&mut **tx)
        .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:SlotExistsTx")]
    pub async fn exists_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        slot_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM slots WHERE id = $1)")
            .bind(slot_id)
            .fetch_one(&mut **tx)
            .await
    }
}

impl Merchant {
    #[tracing::instrument(skip_all, err, name = "SQL:FindMerchantTx")]
    pub async fn find_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: &str,
    ) -> Result<Option<Merchant>, sqlx::Error> {
        sqlx::query_as::<_, Merchant>("SELECT id, name, active FROM merchants WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }
}

impl Product {
    #[tracing::instrument(skip_all, err, name = "SQL:FindProductsTx")]
    pub async fn find_many_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        merchant_id: &str,
        ids: &[String],
    ) -> Result<Vec<Product>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, merchant_id, name, price_cents, in_stock
            FROM products
            WHERE merchant_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(merchant_id)
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
    }
}

impl OrderEvent {
    #[tracing::instrument(skip_all, err, name = "SQL:AppendOrderEventTx")]
    pub async fn append_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        event: &OrderEvent,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO order_events (id, order_id, event_type, payload, created_at, actor_user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.order_id)
        .bind(event.event_type)
        .bind(&event.payload)
        .bind(event.created_at)
        .bind(&event.actor_user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

impl Refund {
    #[tracing::instrument(skip_all, err, name = "SQL:InsertRefundTx")]
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        refund: &Refund,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refunds (id, order_id, amount_cents, reason, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(refund.id)
        .bind(refund.order_id)
        .bind(refund.amount_cents)
        .bind(&refund.reason)
        .bind(&refund.created_by)
        .bind(refund.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store wiring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.db.pool.begin().await?;
        Ok(Box::new(TransactionProcessor { tx }))
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.db.process(GetOrderById { id }).await?)
    }

    async fn find_order_by_idempotency_key(
        &self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .db
            .process(GetOrderByIdempotencyKey {
                consumer_id: consumer_id.to_owned(),
                key: key.to_owned(),
            })
            .await?)
    }

    async fn list_orders(&self, filter: &OrderListFilter) -> Result<Vec<OrderSummary>, StoreError> {
        Ok(self
            .db
            .process(ListOrders {
                filter: filter.clone(),
            })
            .await?)
    }

    async fn list_events(&self, order_id: Uuid) -> Result<Vec<OrderEvent>, StoreError> {
        Ok(self.db.process(ListOrderEvents { order_id }).await?)
    }

    async fn find_slot(&self, id: &str) -> Result<Option<Slot>, StoreError> {
        Ok(self.db.process(GetSlotById { id: id.to_owned() }).await?)
    }

    async fn list_slots(&self, query: &SlotQuery) -> Result<Vec<Slot>, StoreError> {
        Ok(self
            .db
            .process(ListSlots {
                query: query.clone(),
            })
            .await?)
    }
}

#[async_trait]
impl StoreTransaction for TransactionProcessor {
    async fn find_order_by_idempotency_key(
        &mut self,
        consumer_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StoreError> {
        Ok(Order::find_by_idempotency_key_tx(&mut self.tx, consumer_id, key).await?)
    }

    async fn find_merchant(&mut self, id: &str) -> Result<Option<Merchant>, StoreError> {
        Ok(Merchant::find_tx(&mut self.tx, id).await?)
    }

    async fn reserve_slot(&mut self, slot_id: &str) -> Result<SlotReservation, StoreError> {
        if let Some(slot) = Slot::reserve_tx(&mut self.tx, slot_id).await? {
            return Ok(SlotReservation::Reserved(slot));
        }
        if Slot::exists_tx(&mut self.tx, slot_id).await? {
            Ok(SlotReservation::Full)
        } else {
            Ok(SlotReservation::NotFound)
        }
    }

    async fn find_products(
        &mut self,
        merchant_id: &str,
        ids: &[String],
    ) -> Result<Vec<Product>, StoreError> {
        Ok(Product::find_many_tx(&mut self.tx, merchant_id, ids).await?)
    }

    async fn order_code_taken(&mut self, code: &str) -> Result<bool, StoreError> {
        Ok(Order::code_taken_tx(&mut self.tx, code).await?)
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), StoreError> {
        Ok(Order::insert_tx(&mut self.tx, order).await?)
    }

    async fn lock_order(&mut self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(Order::lock_tx(&mut self.tx, id).await?)
    }

    async fn update_order_state(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        match Order::update_state_tx(&mut self.tx, id, status, payment_status, updated_at).await? {
            0 => Err(StoreError::Missing),
            _ => Ok(()),
        }
    }

    async fn append_event(&mut self, event: &OrderEvent) -> Result<(), StoreError> {
        Ok(OrderEvent::append_tx(&mut self.tx, event).await?)
    }

    async fn insert_refund(&mut self, refund: &Refund) -> Result<(), StoreError> {
        Ok(Refund::insert_tx(&mut self.tx, refund).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("d2y12"), "%d2y12%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
