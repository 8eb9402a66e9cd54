use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::test_support::*;
use crate::server::build_router;

struct Call<'a> {
    method: Method,
    uri: &'a str,
    token: Option<&'a str>,
    idempotency_key: Option<&'a str>,
    body: Option<Value>,
}

impl<'a> Call<'a> {
    fn get(uri: &'a str, token: &'a str) -> Self {
        Self {
            method: Method::GET,
            uri,
            token: Some(token),
            idempotency_key: None,
            body: None,
        }
    }

    fn post(uri: &'a str, token: &'a str, body: Value) -> Self {
        Self {
            method: Method::POST,
            uri,
            token: Some(token),
            idempotency_key: None,
            body: Some(body),
        }
    }

    async fn send(self, router: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(key) = self.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn order_body(slot_id: &str) -> Value {
    json!({
        "merchantId": "bakery-one",
        "slotId": slot_id,
        "address": { "line1": "Damrak 1", "city": "Amsterdam" },
        "items": [
            { "productId": "bread", "qty": 2 },
            { "productId": "bread", "qty": 1 }
        ]
    })
}

async fn create(router: &Router, key: Option<&str>) -> (StatusCode, Value) {
    let mut call = Call::post("/orders", CONSUMER_TOKEN, order_body("slot-cnc"));
    call.idempotency_key = key;
    call.send(router).await
}

#[tokio::test]
async fn test_health_is_public() {
    let router = build_router(app_state());
    let (status, body) = Call {
        token: None,
        ..Call::get("/health", "")
    }
    .send(&router)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_or_unknown_credential_is_unauthorized() {
    let router = build_router(app_state());
    let (status, body) = Call {
        token: None,
        ..Call::get("/orders", "")
    }
    .send(&router)
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = Call::get("/orders", "nobody").send(&router).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_then_replay() {
    let router = build_router(app_state());

    let (status, first) = create(&router, Some("checkout-1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "PLACED");
    assert_eq!(first["paymentStatus"], "UNPAID");
    assert_eq!(first["totals"]["subtotalCents"], 1485);
    assert_eq!(first["totals"]["deliveryFeeCents"], 0);
    assert_eq!(first["items"].as_array().unwrap().len(), 1);
    assert!(first["orderCode"].as_str().unwrap().starts_with("D2Y"));

    let (status, replay) = create(&router, Some(" checkout-1 ")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["id"], first["id"]);

    let (_, slot) = Call::get("/slots/slot-cnc", CONSUMER_TOKEN)
        .send(&router)
        .await;
    assert_eq!(slot["remaining"], 4);
}

#[tokio::test]
async fn test_create_requires_consumer() {
    let router = build_router(app_state());
    let (status, body) = Call::post("/orders", MERCHANT_TOKEN, order_body("slot-cnc"))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let router = build_router(app_state());

    let mut body = order_body("slot-cnc");
    body["items"] = json!([{ "productId": "bread", "qty": 0 }]);
    let (status, err) = Call::post("/orders", CONSUMER_TOKEN, body)
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_input");

    let (status, err) = Call::post("/orders", CONSUMER_TOKEN, json!({ "items": "nope" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_input");
}

#[tokio::test]
async fn test_full_slot_is_conflict() {
    let router = build_router(app_state());
    let (status, _) = Call::post("/orders", CONSUMER_TOKEN, order_body("slot-last"))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = Call::post("/orders", OTHER_CONSUMER_TOKEN, order_body("slot-last"))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "slot_full");
}

#[tokio::test]
async fn test_merchant_transition_rules() {
    let router = build_router(app_state());
    let (_, order) = create(&router, None).await;
    let id = order["id"].as_str().unwrap();
    let status_uri = format!("/orders/{id}/status");

    let (status, body) = Call::post(&status_uri, MERCHANT_TOKEN, json!({ "status": "PACKING" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
    assert_eq!(body["from"], "PLACED");
    assert_eq!(body["to"], "PACKING");

    let (status, _) = Call::post(&format!("/orders/{id}/pay"), CONSUMER_TOKEN, json!({}))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = Call::post(&status_uri, MERCHANT_TOKEN, json!({ "status": "ACCEPTED" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ACCEPTED");
    assert_eq!(body["paymentStatus"], "PAID");

    let (status, _) = Call::post(&status_uri, CONSUMER_TOKEN, json!({ "status": "CANCELLED" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, events) = Call::get(&format!("/orders/{id}/events"), ADMIN_TOKEN)
        .send(&router)
        .await;
    let types: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["ORDER_CREATED", "PAYMENT_PAID", "STATUS_CHANGED"]);
}

#[tokio::test]
async fn test_refund_flow() {
    let router = build_router(app_state());
    let (_, order) = create(&router, None).await;
    let id = order["id"].as_str().unwrap();
    let refund_uri = format!("/orders/{id}/refund");

    let (status, _) = Call::post(&refund_uri, MERCHANT_TOKEN, json!({}))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::post(&refund_uri, SUPPORT_TOKEN, json!({ "amountCents": 99999 }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_refund_amount");

    let (status, body) = Call::post(
        &refund_uri,
        SUPPORT_TOKEN,
        json!({ "amountCents": 500, "reason": "stale bread" }),
    )
    .send(&router)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "REFUNDED");
    assert_eq!(body["order"]["paymentStatus"], "REFUNDED");
    assert_eq!(body["refund"]["amountCents"], 500);
    assert_eq!(body["refund"]["createdBy"], "sam");

    let (status, body) = Call::post(&refund_uri, ADMIN_TOKEN, json!({}))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_refund_without_body_is_full() {
    let router = build_router(app_state());
    let (_, order) = create(&router, None).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = Call {
        method: Method::POST,
        ..Call::get(&format!("/orders/{id}/refund"), ADMIN_TOKEN)
    }
    .send(&router)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund"]["amountCents"], order["totals"]["totalCents"]);
    assert_eq!(body["refund"]["reason"], Value::Null);
    assert_eq!(body["order"]["paymentStatus"], "REFUNDED");
}

#[tokio::test]
async fn test_read_isolation_and_lists() {
    let router = build_router(app_state());
    let (_, order) = create(&router, None).await;
    let id = order["id"].as_str().unwrap();
    let uri = format!("/orders/{id}");

    let (status, _) = Call::get(&uri, OTHER_CONSUMER_TOKEN).send(&router).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = Call::get(&uri, MERCHANT_TOKEN).send(&router).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = Call::get("/orders/not-a-uuid", ADMIN_TOKEN).send(&router).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let missing = format!("/orders/{}", uuid::Uuid::now_v7());
    let (status, body) = Call::get(&missing, ADMIN_TOKEN).send(&router).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, page) = Call::get("/orders", OTHER_CONSUMER_TOKEN).send(&router).await;
    assert_eq!(page["orders"].as_array().unwrap().len(), 0);
    assert_eq!(page["limit"], 50);

    let code = order["orderCode"].as_str().unwrap().to_lowercase();
    let (_, page) = Call::get(&format!("/orders?q={code}&limit=500"), ADMIN_TOKEN)
        .send(&router)
        .await;
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);
    assert_eq!(page["limit"], 100);

    let listed = &page["orders"][0];
    assert_eq!(listed["merchantName"], "Bakery One");
    assert_eq!(
        listed["slot"],
        json!({ "date": "2026-02-06", "type": "CNC", "startTime": "10:00", "endTime": "11:00" })
    );

    let (_, detail) = Call::get(&uri, CONSUMER_TOKEN).send(&router).await;
    assert_eq!(detail["merchantName"], "Bakery One");
    assert_eq!(detail["slot"]["startTime"], "10:00");
}

#[tokio::test]
async fn test_slot_listing() {
    let router = build_router(app_state());
    let (status, body) = Call::get("/slots?date=2026-02-06&type=CNC", CONSUMER_TOKEN)
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    let slots = body.as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["id"], "slot-cnc");
    assert_eq!(slots[0]["startTime"], "10:00");

    let (status, body) = Call::get("/slots?date=06-02-2026&type=CNC", CONSUMER_TOKEN)
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = Call::get("/slots/nope", CONSUMER_TOKEN).send(&router).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
