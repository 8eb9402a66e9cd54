#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use d2y_core::entities::SlotType;
use d2y_core::entities::catalog::{Merchant, Product};
use d2y_core::entities::order::Order;
use d2y_core::entities::slot::Slot;
use d2y_core::events::FanoutHub;
use d2y_core::identity::{Caller, StaffRole};
use d2y_core::lifecycle::{CreateOrder, OrderCodeGenerator, OrderEngine, OrderLine, OrderSettings};
use d2y_core::store::{MemoryStore, OrderStore, Seed};
use time::macros::{date, time};

pub const BAKERY: &str = "bakery-one";
pub const BUTCHER: &str = "butcher-two";
pub const DELIVERY_FEE: i64 = 299;

pub struct Fixture {
    pub store: MemoryStore,
    pub engine: OrderEngine,
    pub hub: FanoutHub,
}

impl Fixture {
    pub async fn remaining(&self, slot_id: &str) -> i32 {
        self.store.find_slot(slot_id).await.unwrap().unwrap().remaining
    }
}

pub struct FixedCode(pub &'static str);

impl OrderCodeGenerator for FixedCode {
    fn generate(&self) -> String {
        self.0.to_owned()
    }
}

fn merchant(id: &str, active: bool) -> Merchant {
    Merchant {
        id: id.into(),
        name: id.to_uppercase(),
        active,
    }
}

fn product(id: &str, merchant_id: &str, price_cents: i64, in_stock: bool) -> Product {
    Product {
        id: id.into(),
        merchant_id: merchant_id.into(),
        name: format!("{id} (fresh)"),
        price_cents,
        in_stock,
    }
}

pub fn slot(id: &str, slot_type: SlotType, capacity: i32) -> Slot {
    Slot {
        id: id.into(),
        date: date!(2026 - 02 - 06),
        slot_type,
        start_time: time!(10:00),
        end_time: time!(11:00),
        capacity,
        remaining: capacity,
    }
}

pub fn seed() -> Seed {
    Seed {
        merchants: vec![
            merchant(BAKERY, true),
            merchant(BUTCHER, true),
            merchant("closed-shop", false),
        ],
        products: vec![
            product("bread", BAKERY, 495, true),
            product("cake", BAKERY, 250, true),
            product("sold-out", BAKERY, 300, false),
            product("steak", BUTCHER, 1299, true),
        ],
        slots: vec![
            slot("slot-cnc", SlotType::Cnc, 10),
            slot("slot-delivery", SlotType::Delivery, 10),
            slot("slot-last", SlotType::Delivery, 1),
            slot("slot-three", SlotType::Cnc, 3),
        ],
    }
}

pub fn fixture() -> Fixture {
    fixture_with(None)
}

pub fn fixture_with(codes: Option<FixedCode>) -> Fixture {
    let store = MemoryStore::seeded(seed(), Duration::from_secs(5));
    let hub = FanoutHub::new();
    let settings = OrderSettings {
        delivery_fee_cents: DELIVERY_FEE,
        ..OrderSettings::default()
    };
    let mut engine = OrderEngine::new(Arc::new(store.clone()), hub.clone(), settings);
    if let Some(codes) = codes {
        engine = engine.with_code_generator(codes);
    }
    Fixture { store, engine, hub }
}

pub fn alice() -> Caller {
    Caller::consumer("alice")
}

pub fn bob() -> Caller {
    Caller::consumer("bob")
}

pub fn bakery_staff() -> Caller {
    Caller::merchant("baker-1", BAKERY)
}

pub fn butcher_staff() -> Caller {
    Caller::merchant("butcher-1", BUTCHER)
}

pub fn admin() -> Caller {
    Caller::staff("admin-1", StaffRole::Admin)
}

pub fn support() -> Caller {
    Caller::staff("support-1", StaffRole::Support)
}

pub fn order_input(slot_id: &str, items: &[(&str, i64)], key: Option<&str>) -> CreateOrder {
    CreateOrder {
        merchant_id: BAKERY.into(),
        slot_id: slot_id.into(),
        address: serde_json::json!({
            "line1": "Damrak 1",
            "postalCode": "1012LG",
            "city": "Amsterdam",
            "country": "NL"
        }),
        instructions: Some("Ring twice".into()),
        items: items
            .iter()
            .map(|(product_id, qty)| OrderLine {
                product_id: (*product_id).into(),
                qty: *qty,
            })
            .collect(),
        idempotency_key: key.map(str::to_owned),
    }
}

pub async fn place(fx: &Fixture, caller: &Caller, slot_id: &str) -> Order {
    fx.engine
        .create_order(caller, order_input(slot_id, &[("bread", 1)], None))
        .await
        .unwrap()
        .into_order()
}

pub fn assert_totals_consistent(order: &Order) {
    let subtotal: i64 = order
        .items
        .iter()
        .map(|i| i.unit_price_cents * i.qty)
        .sum();
    assert_eq!(order.totals.subtotal_cents, subtotal);
    assert_eq!(
        order.totals.total_cents,
        order.totals.subtotal_cents + order.totals.delivery_fee_cents
    );
    assert_eq!(
        order.totals.items_count,
        order.items.iter().map(|i| i.qty).sum::<i64>()
    );
}
