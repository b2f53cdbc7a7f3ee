use market_payment_engine::{
    db_types::{OrderStatusType, ProductStatus},
    traits::{Completion, CompletionOutcome, PaymentLedgerDatabase, ProductCatalog},
    OrderFlowError,
};
use mkt_common::Money;
use support::{Market, BUYER, OTHER_BUYER, SELLER};

mod support;

#[tokio::test]
async fn completion_is_applied_exactly_once() {
    let market = Market::new().await;
    let product = market.list_product("Lamp", Money::from_units(100)).await;
    let checkout = market.buy_now(product.id, BUYER).await;

    let completion = Completion::new(checkout.session_id.as_str())
        .with_payment_reference(Some("pi_001"))
        .with_charge_reference(Some("ch_001"))
        .with_raw_payload(r#"{"id":"evt"}"#);
    let first = market.orders.apply_completion(completion.clone()).await.unwrap();
    let (order, payment) = match first {
        CompletionOutcome::Paid { order, payment } => (order, payment),
        other => panic!("Expected Paid, got {other:?}"),
    };
    assert_eq!(order.status, OrderStatusType::Paid);
    assert!(order.paid_at.is_some());
    assert_eq!(payment.order_id, order.id);
    assert_eq!(payment.amount, Money::from_units(100));
    assert_eq!(payment.currency, "eur");
    assert_eq!(payment.external_payment_reference.as_deref(), Some("pi_001"));
    assert_eq!(payment.external_charge_reference.as_deref(), Some("ch_001"));
    assert!(payment.successful);

    let second = market.orders.apply_completion(completion).await.unwrap();
    assert!(matches!(second, CompletionOutcome::AlreadyPaid { .. }));

    let product = market.db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.status, ProductStatus::Sold);
    assert_eq!(product.buyer_id, Some(BUYER));
    assert!(product.sold_at.is_some());
    let stored = market.db.fetch_payment_for_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored, payment);
    assert_eq!(market.payment_count(order.id).await, 1);
    market.tear_down().await;
}

#[tokio::test]
async fn concurrent_completions_pay_once() {
    let market = Market::new().await;
    let product = market.list_product("Bicycle", Money::from_units(250)).await;
    let checkout = market.buy_now(product.id, BUYER).await;

    let push = market.orders.clone();
    let pull = market.orders.clone();
    let c1 = Completion::new(checkout.session_id.as_str()).with_payment_reference(Some("pi_race"));
    let c2 = c1.clone();
    let (a, b) = tokio::join!(push.apply_completion(c1), pull.apply_completion(c2));
    let outcomes = [a.unwrap(), b.unwrap()];
    let paid = outcomes.iter().filter(|o| o.is_newly_paid()).count();
    let already = outcomes.iter().filter(|o| matches!(o, CompletionOutcome::AlreadyPaid { .. })).count();
    assert_eq!(paid, 1);
    assert_eq!(already, 1);
    let order = market.db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert_eq!(market.payment_count(order.id).await, 1);
    market.tear_down().await;
}

#[tokio::test]
async fn writes_are_visible_to_every_pooled_connection() {
    let market = Market::new().await;
    let product = market.list_product("Radio", Money::from_units(30)).await;
    for _ in 0..10 {
        let seen = market.db.fetch_product(product.id).await.unwrap();
        assert_eq!(seen.map(|p| p.id), Some(product.id));
    }
    let checkout = market.buy_now(product.id, BUYER).await;
    for _ in 0..10 {
        let order = market.db.fetch_order(checkout.order_id).await.unwrap().expect("Order not visible");
        assert_eq!(order.external_session_id.as_deref(), Some(checkout.session_id.as_str()));
    }
    let since = chrono::Utc::now() - chrono::Duration::hours(1);
    let pollable = market.db.fetch_pollable_orders(since, 10).await.unwrap();
    assert_eq!(pollable.iter().map(|o| o.id).collect::<Vec<_>>(), vec![checkout.order_id]);
    let order = market.db.fetch_order_by_session_id(&checkout.session_id).await.unwrap();
    assert_eq!(order.map(|o| o.id), Some(checkout.order_id));
    market.tear_down().await;
}

#[tokio::test]
async fn abandoned_completion_does_not_lock_the_database() {
    let market = Market::new().await;
    let product = market.list_product("Mirror", Money::from_units(60)).await;
    let checkout = market.buy_now(product.id, BUYER).await;
    let completion = Completion::new(checkout.session_id.as_str()).with_payment_reference(Some("pi_gone"));

    // Give up on the completion almost immediately, dropping it part way through
    let _ = tokio::time::timeout(
        std::time::Duration::from_micros(300),
        market.orders.apply_completion(completion.clone()),
    )
    .await;

    // Later writers must not find the database locked
    let other = market.list_product("Vase", Money::from_units(15)).await;
    assert!(market.db.fetch_product(other.id).await.unwrap().is_some());
    let outcome = market.orders.apply_completion(completion).await.unwrap();
    assert!(matches!(outcome, CompletionOutcome::Paid { .. } | CompletionOutcome::AlreadyPaid { .. }));
    let order = market.db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert_eq!(market.payment_count(order.id).await, 1);
    market.tear_down().await;
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let market = Market::new().await;
    let outcome = market.orders.apply_completion(Completion::new("cs_nobody")).await.unwrap();
    assert_eq!(outcome, CompletionOutcome::NotFound);
    assert!(outcome.order().is_none());
    market.tear_down().await;
}

#[tokio::test]
async fn failed_orders_are_not_resurrected() {
    let market = Market::new().await;
    let product = market.list_product("Chair", Money::from_units(40)).await;
    let checkout = market.buy_now(product.id, BUYER).await;
    let failed = market.orders.fail_order(checkout.order_id, "test").await.unwrap().unwrap();
    assert_eq!(failed.status, OrderStatusType::Failed);
    // Failing twice does nothing
    assert!(market.orders.fail_order(checkout.order_id, "test").await.unwrap().is_none());

    let outcome = market.orders.apply_completion(Completion::new(checkout.session_id.as_str())).await.unwrap();
    let order = match outcome {
        CompletionOutcome::NotPayable { order } => order,
        other => panic!("Expected NotPayable, got {other:?}"),
    };
    assert_eq!(order.status, OrderStatusType::Failed);
    assert!(market.db.fetch_payment_for_order(order.id).await.unwrap().is_none());
    let product = market.db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.status, ProductStatus::Available);
    market.tear_down().await;
}

#[tokio::test]
async fn only_the_buyer_cancels_pending_orders() {
    let market = Market::new().await;
    let product = market.list_product("Rug", Money::from_units(60)).await;
    let checkout = market.buy_now(product.id, BUYER).await;

    let err = market.orders.cancel_order(checkout.order_id, SELLER).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Forbidden(_)));
    let order = market.orders.cancel_order(checkout.order_id, BUYER).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    let err = market.orders.cancel_order(checkout.order_id, BUYER).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::NotPending { status: OrderStatusType::Cancelled, .. }));
    let err = market.orders.cancel_order(9999, BUYER).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(9999)));
    market.tear_down().await;
}

#[tokio::test]
async fn orders_are_visible_to_participants_only() {
    let market = Market::new().await;
    let lamp = market.list_product("Lamp", Money::from_units(10)).await;
    let vase = market.list_product("Vase", Money::from_units(20)).await;
    let first = market.buy_now(lamp.id, BUYER).await;
    let second = market.buy_now(vase.id, BUYER).await;

    assert_eq!(market.orders.fetch_order(first.order_id, SELLER).await.unwrap().id, first.order_id);
    assert_eq!(market.orders.fetch_order(first.order_id, BUYER).await.unwrap().id, first.order_id);
    let err = market.orders.fetch_order(first.order_id, OTHER_BUYER).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Forbidden(_)));

    let mine = market.orders.orders_for_user(BUYER).await.unwrap();
    let ids = mine.iter().map(|o| o.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![second.order_id, first.order_id]);
    assert!(market.orders.orders_for_user(OTHER_BUYER).await.unwrap().is_empty());
    market.tear_down().await;
}
