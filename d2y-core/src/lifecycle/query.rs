use d2y_sdk::objects::{OrderPageResponse, OrderSummaryResponse, clamp_pagination};
use uuid::Uuid;

use super::{OrderEngine, OrderError, Resource};
use crate::access::{self, Action};
use crate::entities::event::OrderEvent;
use crate::entities::order::{Order, OrderListFilter, OrderSummary};
use crate::entities::slot::{Slot, SlotQuery};
use crate::events::Group;
use crate::identity::Caller;

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub limit: i64,
    pub offset: i64,
}

impl From<&OrderPage> for OrderPageResponse {
    fn from(page: &OrderPage) -> Self {
        OrderPageResponse {
            orders: page.orders.iter().map(OrderSummaryResponse::from).collect(),
            limit: page.limit,
            offset: page.offset,
        }
    }
}

impl OrderEngine {
    /// Orders visible to `caller`, newest first.
    pub async fn list_orders(
        &self,
        caller: &Caller,
        code_search: Option<String>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<OrderPage, OrderError> {
        let default_limit = self.settings().await.list_limit;
        let (limit, offset) = clamp_pagination(limit.unwrap_or(default_limit), offset);
        let filter = OrderListFilter {
            scope: access::list_scope(caller),
            code_search: code_search
                .map(|q| q.trim().to_owned())
                .filter(|q| !q.is_empty()),
            limit,
            offset,
        };
        let orders = self.store.list_orders(&filter).await?;
        Ok(OrderPage {
            orders,
            limit,
            offset,
        })
    }

    pub async fn get_order(&self, caller: &Caller, order_id: Uuid) -> Result<Order, OrderError> {
        self.readable_order(caller, order_id, Action::Read).await
    }

    /// Audit trail of an order, oldest first.
    pub async fn order_events(
        &self,
        caller: &Caller,
        order_id: Uuid,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.readable_order(caller, order_id, Action::Read).await?;
        Ok(self.store.list_events(order_id).await?)
    }

    /// Check that `caller` may follow `order_id` live and return the group
    /// to join.
    pub async fn order_group(&self, caller: &Caller, order_id: Uuid) -> Result<Group, OrderError> {
        self.readable_order(caller, order_id, Action::Subscribe)
            .await
            .map(|order| Group::Order(order.id))
    }

    pub async fn list_slots(&self, query: &SlotQuery) -> Result<Vec<Slot>, OrderError> {
        Ok(self.store.list_slots(query).await?)
    }

    pub async fn get_slot(&self, slot_id: &str) -> Result<Slot, OrderError> {
        self.store
            .find_slot(slot_id)
            .await?
            .ok_or(OrderError::NotFound(Resource::Slot))
    }

    async fn readable_order(
        &self,
        caller: &Caller,
        order_id: Uuid,
        action: Action,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(Resource::Order))?;
        access::authorize(caller, action, Some(order.ownership()))?;
        Ok(order)
    }
}
