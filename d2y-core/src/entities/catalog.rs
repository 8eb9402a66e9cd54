//! Read-only catalog records consulted while placing an order.

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub in_stock: bool,
}
