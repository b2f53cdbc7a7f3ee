use actix_web::{http::StatusCode, test::TestRequest};
use market_payment_engine::{
    db_types::{Order, OrderStatusType},
    events::EventProducers,
    test_utils::{fake_provider::FakeProvider, prepare_env::tear_down},
    CheckoutApi,
    CheckoutParams,
    PayableTarget,
    SqliteDatabase,
};

use super::helpers::{as_user, engine_data, seeded_database, send, BUYER, SELLER, STRANGER};
use crate::routes::{health, CancelOrderRoute, MyOrdersRoute, OrderByIdRoute};

fn order_routes(cfg: &mut actix_web::web::ServiceConfig, db: &SqliteDatabase) {
    engine_data(cfg, db, FakeProvider::new());
    cfg.service(MyOrdersRoute::<SqliteDatabase>::new())
        .service(OrderByIdRoute::<SqliteDatabase>::new())
        .service(CancelOrderRoute::<SqliteDatabase>::new());
}

async fn pending_order(db: &SqliteDatabase, product_id: i64) -> i64 {
    let checkout = CheckoutApi::new(db.clone(), FakeProvider::new(), EventProducers::default());
    let params = CheckoutParams::new(BUYER, "https://market.example.com/ok", "https://market.example.com/cancel");
    checkout.create_checkout(PayableTarget::Direct { product_id }, params).await.unwrap().order_id
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn buyers_and_sellers_see_their_orders() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let order_id = pending_order(&db, product.id).await;
    for user in [BUYER, SELLER] {
        let req = as_user(TestRequest::get().uri("/orders"), user);
        let (status, body) = send(req, |cfg| order_routes(cfg, &db)).await;
        assert_eq!(status, StatusCode::OK);
        let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);

        let req = as_user(TestRequest::get().uri(&format!("/orders/{order_id}")), user);
        let (status, _) = send(req, |cfg| order_routes(cfg, &db)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let req = as_user(TestRequest::get().uri("/orders"), STRANGER);
    let (_, body) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(body, "[]");
    let req = as_user(TestRequest::get().uri(&format!("/orders/{order_id}")), STRANGER);
    let (status, _) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let req = as_user(TestRequest::get().uri("/orders/999"), BUYER);
    let (status, _) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}

#[actix_web::test]
async fn buyer_cancels_a_pending_order() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let order_id = pending_order(&db, product.id).await;

    let req = as_user(TestRequest::post().uri(&format!("/orders/{order_id}/cancel")), SELLER);
    let (status, _) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = as_user(TestRequest::post().uri(&format!("/orders/{order_id}/cancel")), BUYER);
    let (status, body) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);

    let req = as_user(TestRequest::post().uri(&format!("/orders/{order_id}/cancel")), BUYER);
    let (status, _) = send(req, |cfg| order_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}
