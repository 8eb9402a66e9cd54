//! Router fixtures: an in-memory store seeded from a config snippet.

use std::sync::Arc;

use d2y_core::events::FanoutHub;
use d2y_core::identity::Caller;
use d2y_core::lifecycle::{CreateOrder, OrderEngine, OrderLine};
use d2y_core::store::MemoryStore;
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::credentials::CredentialStore;
use crate::state::AppState;

pub const CONSUMER_TOKEN: &str = "alice-token";
pub const OTHER_CONSUMER_TOKEN: &str = "bob-token";
pub const MERCHANT_TOKEN: &str = "bakery-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const SUPPORT_TOKEN: &str = "support-token";

const CONFIG: &str = r#"
[orders]
delivery_fee_cents = 299

[[credentials]]
token = "alice-token"
user_id = "alice"
role = "CONSUMER"

[[credentials]]
token = "bob-token"
user_id = "bob"
role = "CONSUMER"

[[credentials]]
token = "bakery-token"
user_id = "baker"
role = "MERCHANT"
merchant_id = "bakery-one"

[[credentials]]
token = "admin-token"
user_id = "admin-1"
role = "ADMIN"

[[credentials]]
token = "support-token"
user_id = "sam"
role = "SUPPORT"

[[seed.merchants]]
id = "bakery-one"
name = "Bakery One"

[[seed.products]]
id = "bread"
merchant_id = "bakery-one"
name = "Sourdough"
price_cents = 495

[[seed.slots]]
id = "slot-cnc"
date = "2026-02-06"
type = "CNC"
start_time = "10:00"
end_time = "11:00"
capacity = 5

[[seed.slots]]
id = "slot-last"
date = "2026-02-06"
type = "DELIVERY"
start_time = "12:00"
end_time = "13:00"
capacity = 1
"#;

pub fn app_state() -> AppState {
    let loaded = config::parse(CONFIG, None).unwrap();
    let store = MemoryStore::seeded(loaded.seed, loaded.database.statement_timeout);
    let engine = OrderEngine::new(Arc::new(store), FanoutHub::new(), loaded.orders);
    AppState::new(engine, Arc::new(CredentialStore::new(loaded.credentials)))
}

/// Place one order for alice on `slot-cnc` straight through the engine.
pub async fn place_order(state: &AppState) -> Uuid {
    let input = CreateOrder {
        merchant_id: "bakery-one".into(),
        slot_id: "slot-cnc".into(),
        address: json!({ "line1": "Damrak 1" }),
        instructions: None,
        items: vec![OrderLine {
            product_id: "bread".into(),
            qty: 2,
        }],
        idempotency_key: None,
    };
    state
        .engine
        .create_order(&Caller::consumer("alice"), input)
        .await
        .unwrap()
        .into_order()
        .id
}
