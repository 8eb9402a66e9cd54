use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{OrderEngine, OrderError, Resource};
use crate::access::{self, Action};
use crate::entities::event::{NewOrderEvent, OrderEventType};
use crate::entities::order::Order;
use crate::entities::{OrderStatus, PaymentStatus};
use crate::identity::{Caller, Role};

impl OrderEngine {
    /// Record payment for an order.
    ///
    /// Paying twice is a no-op. A `PLACED` order advances to `PAID`; later
    /// statuses are kept as they are.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, actor = %caller.user_id))]
    pub async fn pay_order(&self, caller: &Caller, order_id: Uuid) -> Result<Order, OrderError> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(Resource::Order))?;
        access::authorize(caller, Action::Pay, Some(order.ownership()))?;

        match order.payment_status {
            PaymentStatus::Paid => {
                tx.rollback().await?;
                return Ok(order);
            }
            PaymentStatus::Refunded => {
                return Err(OrderError::Conflict("order payment was refunded"));
            }
            PaymentStatus::Unpaid => {}
        }

        let status = match order.status {
            OrderStatus::Placed => OrderStatus::Paid,
            other => other,
        };
        let now = OffsetDateTime::now_utc();
        tx.update_order_state(order.id, status, PaymentStatus::Paid, now)
            .await?;
        let event = NewOrderEvent {
            order_id: order.id,
            event_type: OrderEventType::PaymentPaid,
            payload: json!({
                "paymentStatus": PaymentStatus::Paid.to_string(),
                "status": status.to_string(),
            }),
            actor_user_id: Some(caller.user_id.clone()),
        }
        .into_event();
        tx.append_event(&event).await?;
        tx.commit().await?;

        order.status = status;
        order.payment_status = PaymentStatus::Paid;
        order.updated_at = now;
        tracing::info!(status = %status, "order paid");
        self.announce_update(&order, &event);
        Ok(order)
    }

    /// Move an order to `next`.
    ///
    /// Setting the current status again is a no-op. Merchant staff may only
    /// take the forward steps of [`OrderStatus::merchant_next`]; admin-like
    /// callers may set any status.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, actor = %caller.user_id, to = %next))]
    pub async fn set_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(Resource::Order))?;
        access::authorize(caller, Action::SetStatus, Some(order.ownership()))?;

        let from = order.status;
        if from == next {
            tx.rollback().await?;
            return Ok(order);
        }
        if matches!(caller.role, Role::Merchant(_)) && !from.merchant_next().contains(&next) {
            return Err(OrderError::InvalidTransition { from, to: next });
        }

        let now = OffsetDateTime::now_utc();
        tx.update_order_state(order.id, next, order.payment_status, now)
            .await?;
        let event = NewOrderEvent {
            order_id: order.id,
            event_type: OrderEventType::StatusChanged,
            payload: json!({ "from": from.to_string(), "to": next.to_string() }),
            actor_user_id: Some(caller.user_id.clone()),
        }
        .into_event();
        tx.append_event(&event).await?;
        tx.commit().await?;

        order.status = next;
        order.updated_at = now;
        tracing::info!(from = %from, "order status changed");
        self.announce_update(&order, &event);
        Ok(order)
    }
}
