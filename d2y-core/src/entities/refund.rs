use d2y_sdk::objects::RefundResponse;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Refund {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount_cents: i64,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub order_id: Uuid,
    pub amount_cents: i64,
    pub reason: Option<String>,
    pub created_by: String,
}

impl NewRefund {
    pub fn into_refund(self) -> Refund {
        Refund {
            id: Uuid::now_v7(),
            order_id: self.order_id,
            amount_cents: self.amount_cents,
            reason: self.reason,
            created_by: self.created_by,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl From<&Refund> for RefundResponse {
    fn from(r: &Refund) -> Self {
        RefundResponse {
            id: r.id,
            order_id: r.order_id,
            amount_cents: r.amount_cents,
            reason: r.reason.clone(),
            created_by: r.created_by.clone(),
            created_at: r.created_at,
        }
    }
}
