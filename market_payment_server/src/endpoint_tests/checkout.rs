use actix_web::{http::StatusCode, test::TestRequest};
use market_payment_engine::{
    db_types::{NewOffer, OrderStatusType},
    test_utils::prepare_env::tear_down,
    traits::{PaymentLedgerDatabase, ProviderError},
    CheckoutSession,
    OfferApi,
    SqliteDatabase,
};
use mkt_common::Money;
use serde_json::json;

use super::{
    helpers::{as_user, engine_data, seeded_database, send, BUYER, SELLER},
    mocks::{session, MockProvider},
};
use crate::routes::{OfferCheckoutRoute, ProductCheckoutRoute};

fn redirects() -> serde_json::Value {
    json!({
        "success_url": "https://market.example.com/ok",
        "cancel_url": "https://market.example.com/cancel",
        "email": "buyer@example.com"
    })
}

#[actix_web::test]
async fn direct_checkout() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let mut provider = MockProvider::new();
    provider
        .expect_create_checkout_session()
        .withf(|req| {
            req.amount == Money::from_units(120) &&
                req.seller_id == SELLER &&
                req.buyer_id == BUYER &&
                req.customer_email.as_deref() == Some("buyer@example.com")
        })
        .times(1)
        .returning(|_| Ok(session("cs_test_direct")));
    let req = as_user(TestRequest::post().uri(&format!("/products/{}/checkout", product.id)), BUYER)
        .set_json(redirects());
    let (status, body) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(ProductCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let checkout: CheckoutSession = serde_json::from_str(&body).expect("Not a checkout session");
    assert_eq!(checkout.session_id, "cs_test_direct");
    assert_eq!(checkout.url.as_deref(), Some("https://checkout.example.com/pay/cs_test_direct"));
    let order = db.fetch_order(checkout.order_id).await.unwrap().expect("Order was not saved");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.external_session_id.as_deref(), Some("cs_test_direct"));
    assert_eq!(order.platform_fee, Money::from_cents(1200));
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_without_identity() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let mut provider = MockProvider::new();
    provider.expect_create_checkout_session().never();
    let req = TestRequest::post().uri(&format!("/products/{}/checkout", product.id)).set_json(redirects());
    let (status, _) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(ProductCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(db.fetch_orders_for_user(BUYER).await.unwrap().is_empty());
    tear_down(db).await;
}

#[actix_web::test]
async fn buying_your_own_product() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let mut provider = MockProvider::new();
    provider.expect_create_checkout_session().never();
    let req = as_user(TestRequest::post().uri(&format!("/products/{}/checkout", product.id)), SELLER)
        .set_json(redirects());
    let (status, body) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(ProductCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    tear_down(db).await;
}

#[actix_web::test]
async fn provider_failure_fails_the_order() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let mut provider = MockProvider::new();
    provider
        .expect_create_checkout_session()
        .times(1)
        .returning(|_| Err(ProviderError::Unavailable("connection reset".into())));
    let req = as_user(TestRequest::post().uri(&format!("/products/{}/checkout", product.id)), BUYER)
        .set_json(redirects());
    let (status, body) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(ProductCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    let orders = db.fetch_orders_for_user(BUYER).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Failed);
    tear_down(db).await;
}

#[actix_web::test]
async fn negotiated_checkout() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let offers = OfferApi::new(db.clone());
    let offer = offers
        .create_offer(NewOffer { conversation_id: 5, product_id: product.id, buyer_id: BUYER, amount: Money::from_units(80) })
        .await
        .unwrap();
    offers.respond_to_offer(offer.id, SELLER, true).await.unwrap();
    let offer_id = offer.id;
    let mut provider = MockProvider::new();
    provider
        .expect_create_checkout_session()
        .withf(move |req| {
            req.amount == Money::from_units(80) &&
                req.offer_id == Some(offer_id) &&
                req.description.as_deref() == Some("Negotiated price: 80.00 (Original: 120.00)")
        })
        .times(1)
        .returning(|_| Ok(session("cs_test_offer")));
    let req = as_user(TestRequest::post().uri(&format!("/offers/{}/payment", offer.id)), BUYER).set_json(redirects());
    let (status, body) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(OfferCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let checkout: CheckoutSession = serde_json::from_str(&body).unwrap();
    let order = db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.price, Money::from_units(80));
    assert_eq!(order.offer_id, Some(offer_id));
    tear_down(db).await;
}

#[actix_web::test]
async fn paying_for_an_offer_that_was_not_accepted() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let offers = OfferApi::new(db.clone());
    let offer = offers
        .create_offer(NewOffer { conversation_id: 5, product_id: product.id, buyer_id: BUYER, amount: Money::from_units(80) })
        .await
        .unwrap();
    let mut provider = MockProvider::new();
    provider.expect_create_checkout_session().never();
    let req = as_user(TestRequest::post().uri(&format!("/offers/{}/payment", offer.id)), BUYER).set_json(redirects());
    let (status, _) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(OfferCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let req = as_user(TestRequest::post().uri("/offers/999/payment"), BUYER).set_json(redirects());
    let mut provider = MockProvider::new();
    provider.expect_create_checkout_session().never();
    let (status, _) = send(req, |cfg| {
        engine_data(cfg, &db, provider);
        cfg.service(OfferCheckoutRoute::<SqliteDatabase, MockProvider>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}
