use actix_web::{http::StatusCode, test::TestRequest};
use market_payment_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    test_utils::{fake_provider::FakeProvider, prepare_env::tear_down},
    traits::{PaymentLedgerDatabase, WebhookEventLog},
    CheckoutApi,
    CheckoutParams,
    CheckoutSession,
    PayableTarget,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{engine_data, seeded_database, send, signed_webhook, webhook_scope, BUYER};
use crate::data_objects::JsonResponse;

async fn open_checkout(db: &SqliteDatabase, product_id: i64) -> CheckoutSession {
    let checkout = CheckoutApi::new(db.clone(), FakeProvider::new(), EventProducers::default());
    let params = CheckoutParams::new(BUYER, "https://market.example.com/ok", "https://market.example.com/cancel");
    checkout.create_checkout(PayableTarget::Direct { product_id }, params).await.unwrap()
}

fn session_event(event_id: &str, event_type: &str, session_id: &str) -> String {
    json!({
        "id": event_id,
        "type": event_type,
        "created": 1_717_000_000,
        "data": { "object": {
            "id": session_id,
            "object": "checkout.session",
            "status": "complete",
            "payment_status": "paid",
            "payment_intent": "pi_endpoint_1"
        }}
    })
    .to_string()
}

async fn deliver(db: &SqliteDatabase, req: TestRequest) -> (StatusCode, String) {
    send(req, |cfg| {
        engine_data(cfg, db, FakeProvider::new());
        webhook_scope(cfg);
    })
    .await
}

#[actix_web::test]
async fn completed_checkout_marks_the_order_paid_once() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let checkout = open_checkout(&db, product.id).await;
    let payload = session_event("evt_paid_1", "checkout.session.completed", &checkout.session_id);

    let (status, body) = deliver(&db, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    let order = db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    let payment = db.fetch_payment_for_order(order.id).await.unwrap().expect("Payment was not recorded");
    assert_eq!(payment.external_payment_reference.as_deref(), Some("pi_endpoint_1"));
    assert!(db.fetch_event("evt_paid_1").await.unwrap().unwrap().processed);

    let (status, body) = deliver(&db, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Event evt_paid_1 already processed");
    tear_down(db).await;
}

#[actix_web::test]
async fn unsigned_and_forged_webhooks_are_rejected() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let checkout = open_checkout(&db, product.id).await;
    let payload = session_event("evt_forged", "checkout.session.completed", &checkout.session_id);

    let req = TestRequest::post().uri("/webhooks/stripe").set_payload(payload.clone());
    let (status, _) = deliver(&db, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/webhooks/stripe")
        .insert_header((stripe_tools::SIGNATURE_HEADER, "t=1717000000,v1=00ff"))
        .set_payload(payload.clone());
    let (status, _) = deliver(&db, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Signed over a different body
    let req = signed_webhook("{}").set_payload(payload);
    let (status, _) = deliver(&db, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(db.fetch_event("evt_forged").await.unwrap().is_none());
    let order = db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    tear_down(db).await;
}

#[actix_web::test]
async fn benign_events_are_acknowledged() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let checkout = open_checkout(&db, product.id).await;

    let payload = session_event("evt_unknown", "checkout.session.completed", "cs_does_not_exist");
    let (status, body) = deliver(&db, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "Order not found");

    let payload = json!({ "id": "evt_other", "type": "customer.created", "data": { "object": { "id": "cus_1" } } });
    let (status, body) = deliver(&db, signed_webhook(&payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Unhandled event type: customer.created");

    let payload = session_event("evt_expired", "checkout.session.expired", &checkout.session_id);
    let (status, body) = deliver(&db, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = db.fetch_order(checkout.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Failed);
    tear_down(db).await;
}

#[actix_web::test]
async fn malformed_webhook_is_a_bad_request() {
    let _ = env_logger::try_init();
    let (db, _) = seeded_database().await;
    let (status, _) = deliver(&db, signed_webhook("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}
