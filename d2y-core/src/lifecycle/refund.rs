use d2y_sdk::objects::{LiveEvent, RefundResponse};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{OrderEngine, OrderError, Resource, order_audience};
use crate::access::{self, Action};
use crate::entities::event::{NewOrderEvent, OrderEventType};
use crate::entities::order::Order;
use crate::entities::refund::{NewRefund, Refund};
use crate::entities::{OrderStatus, PaymentStatus};
use crate::identity::Caller;

#[derive(Debug, Clone, Default)]
pub struct RefundOrder {
    /// Defaults to the order total.
    pub amount_cents: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundResult {
    pub order: Order,
    pub refund: Refund,
}

impl OrderEngine {
    /// Refund an order in full or in part and close it as `REFUNDED`.
    ///
    /// An order refunds at most once; a second attempt is a `Conflict`.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, actor = %caller.user_id))]
    pub async fn refund_order(
        &self,
        caller: &Caller,
        order_id: Uuid,
        input: RefundOrder,
    ) -> Result<RefundResult, OrderError> {
        access::authorize_role(caller, Action::Refund)?;

        let mut tx = self.store.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(Resource::Order))?;
        access::authorize(caller, Action::Refund, Some(order.ownership()))?;

        if order.payment_status == PaymentStatus::Refunded {
            return Err(OrderError::Conflict("order already refunded"));
        }
        let amount_cents = input.amount_cents.unwrap_or(order.totals.total_cents);
        if amount_cents <= 0 || amount_cents > order.totals.total_cents {
            return Err(OrderError::InvalidRefundAmount);
        }

        let refund = NewRefund {
            order_id: order.id,
            amount_cents,
            reason: input
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_owned),
            created_by: caller.user_id.clone(),
        }
        .into_refund();
        tx.insert_refund(&refund).await?;

        let now = OffsetDateTime::now_utc();
        tx.update_order_state(order.id, OrderStatus::Refunded, PaymentStatus::Refunded, now)
            .await?;
        let event = NewOrderEvent {
            order_id: order.id,
            event_type: OrderEventType::RefundCreated,
            payload: json!({
                "refundId": refund.id,
                "amountCents": refund.amount_cents,
                "reason": refund.reason,
            }),
            actor_user_id: Some(caller.user_id.clone()),
        }
        .into_event();
        tx.append_event(&event).await?;
        tx.commit().await?;

        order.status = OrderStatus::Refunded;
        order.payment_status = PaymentStatus::Refunded;
        order.updated_at = now;
        tracing::info!(refund_id = %refund.id, amount_cents, "order refunded");

        self.hub.publish(
            &order_audience(&order),
            LiveEvent::RefundCreated(RefundResponse::from(&refund)),
        );
        self.announce_update(&order, &event);
        Ok(RefundResult { order, refund })
    }
}
