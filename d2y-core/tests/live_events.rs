mod common;

use common::*;
use d2y_core::entities::OrderStatus;
use d2y_core::events::{Group, Subscription};
use d2y_core::lifecycle::{OrderError, RefundOrder};
use uuid::Uuid;

fn drain(sub: &mut Subscription) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Some(event) = sub.try_recv() {
        names.push(event.name());
    }
    names
}

#[tokio::test]
async fn test_create_reaches_admin_and_owning_merchant() {
    let fx = fixture();
    let mut admin_sub = fx.hub.subscribe(Group::for_session(&admin()));
    let mut bakery_sub = fx.hub.subscribe(Group::for_session(&bakery_staff()));
    let mut butcher_sub = fx.hub.subscribe(Group::for_session(&butcher_staff()));
    let mut alice_sub = fx.hub.subscribe(Group::for_session(&alice()));

    place(&fx, &alice(), "slot-cnc").await;

    assert_eq!(drain(&mut admin_sub), ["order.created", "order.event.created"]);
    assert_eq!(drain(&mut bakery_sub), ["order.created", "order.event.created"]);
    assert!(drain(&mut butcher_sub).is_empty());
    assert!(drain(&mut alice_sub).is_empty());
}

#[tokio::test]
async fn test_order_watchers_follow_updates_once() {
    let fx = fixture();
    let order = place(&fx, &alice(), "slot-cnc").await;

    let group = fx.engine.order_group(&alice(), order.id).await.unwrap();
    let mut alice_sub = fx.hub.subscribe(Group::for_session(&alice()));
    alice_sub.join(group.clone());

    // Admin joined both the admin cohort and the order group.
    let mut admin_sub = fx.hub.subscribe(Group::for_session(&admin()));
    admin_sub.join(group);

    fx.engine.pay_order(&alice(), order.id).await.unwrap();
    assert_eq!(drain(&mut alice_sub), ["order.updated", "order.event.created"]);
    assert_eq!(drain(&mut admin_sub), ["order.updated", "order.event.created"]);

    fx.engine
        .refund_order(&admin(), order.id, RefundOrder::default())
        .await
        .unwrap();
    assert_eq!(
        drain(&mut alice_sub),
        ["refund.created", "order.updated", "order.event.created"]
    );
}

#[tokio::test]
async fn test_failed_operations_publish_nothing() {
    let fx = fixture();
    let order = place(&fx, &alice(), "slot-cnc").await;
    let mut admin_sub = fx.hub.subscribe(Group::for_session(&admin()));

    let err = fx
        .engine
        .set_status(&bakery_staff(), order.id, OrderStatus::Packing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    let err = fx
        .engine
        .create_order(&alice(), order_input("slot-cnc", &[("sold-out", 1)], None))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidInput(_)));

    // No-ops publish nothing either.
    fx.engine
        .set_status(&admin(), order.id, OrderStatus::Placed)
        .await
        .unwrap();

    assert!(drain(&mut admin_sub).is_empty());
}

#[tokio::test]
async fn test_order_group_requires_read_access() {
    let fx = fixture();
    let order = place(&fx, &alice(), "slot-cnc").await;

    assert!(matches!(
        fx.engine.order_group(&bob(), order.id).await,
        Err(OrderError::Forbidden)
    ));
    assert!(matches!(
        fx.engine.order_group(&butcher_staff(), order.id).await,
        Err(OrderError::Forbidden)
    ));
    assert_eq!(
        fx.engine.order_group(&bakery_staff(), order.id).await.unwrap(),
        Group::Order(order.id)
    );
    assert!(matches!(
        fx.engine.order_group(&admin(), Uuid::now_v7()).await,
        Err(OrderError::NotFound(_))
    ));
}
