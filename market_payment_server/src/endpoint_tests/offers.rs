use actix_web::{http::StatusCode, test::TestRequest};
use market_payment_engine::{
    db_types::{Offer, OfferStatus},
    test_utils::{fake_provider::FakeProvider, prepare_env::tear_down},
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{as_user, engine_data, seeded_database, send, BUYER, SELLER, STRANGER};
use crate::routes::{ConversationOffersRoute, CreateOfferRoute, OfferByIdRoute, UpdateOfferRoute};

fn offer_routes(cfg: &mut actix_web::web::ServiceConfig, db: &SqliteDatabase) {
    engine_data(cfg, db, FakeProvider::new());
    cfg.service(CreateOfferRoute::<SqliteDatabase>::new())
        .service(ConversationOffersRoute::<SqliteDatabase>::new())
        .service(UpdateOfferRoute::<SqliteDatabase>::new())
        .service(OfferByIdRoute::<SqliteDatabase>::new());
}

async fn make_offer(db: &SqliteDatabase, product_id: i64, amount: &str) -> (StatusCode, String) {
    let req = as_user(TestRequest::post().uri("/offers"), BUYER).set_json(json!({
        "conversation_id": 3,
        "product_id": product_id,
        "amount": amount
    }));
    send(req, |cfg| offer_routes(cfg, db)).await
}

#[actix_web::test]
async fn offer_lifecycle() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let (status, body) = make_offer(&db, product.id, "80.00").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let offer: Offer = serde_json::from_str(&body).unwrap();
    assert_eq!(offer.status, OfferStatus::Pending);
    assert_eq!(offer.seller_id, SELLER);

    // A second pending offer from the same buyer is refused
    let (status, _) = make_offer(&db, product.id, "90.00").await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The buyer cannot accept their own offer
    let req = as_user(TestRequest::patch().uri(&format!("/offers/{}", offer.id)), BUYER)
        .set_json(json!({ "status": "ACCEPTED" }));
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = as_user(TestRequest::patch().uri(&format!("/offers/{}", offer.id)), SELLER)
        .set_json(json!({ "status": "ACCEPTED" }));
    let (status, body) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let accepted: Offer = serde_json::from_str(&body).unwrap();
    assert_eq!(accepted.status, OfferStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    // Accepting twice is an invalid transition
    let req = as_user(TestRequest::patch().uri(&format!("/offers/{}", offer.id)), SELLER)
        .set_json(json!({ "status": "DECLINED" }));
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Offers can only become paid through checkout
    let req = as_user(TestRequest::patch().uri(&format!("/offers/{}", offer.id)), BUYER)
        .set_json(json!({ "status": "PAID" }));
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}

#[actix_web::test]
async fn invalid_offers() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let (status, _) = make_offer(&db, product.id, "0.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = make_offer(&db, 999, "10.00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = make_offer(&db, product.id, "100000000000000.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let req = TestRequest::post().uri("/offers").set_json(json!({
        "conversation_id": 3,
        "product_id": product.id,
        "amount": "10.00"
    }));
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    tear_down(db).await;
}

#[actix_web::test]
async fn offers_are_private_to_the_parties() {
    let _ = env_logger::try_init();
    let (db, product) = seeded_database().await;
    let (_, body) = make_offer(&db, product.id, "75.50").await;
    let offer: Offer = serde_json::from_str(&body).unwrap();

    let req = as_user(TestRequest::get().uri(&format!("/offers/{}", offer.id)), SELLER);
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::OK);
    let req = as_user(TestRequest::get().uri(&format!("/offers/{}", offer.id)), STRANGER);
    let (status, _) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = as_user(TestRequest::get().uri("/offers?conversation_id=3"), BUYER);
    let (status, body) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(status, StatusCode::OK);
    let offers: Vec<Offer> = serde_json::from_str(&body).unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].id, offer.id);
    let req = as_user(TestRequest::get().uri("/offers?conversation_id=3"), STRANGER);
    let (_, body) = send(req, |cfg| offer_routes(cfg, &db)).await;
    assert_eq!(body, "[]");
    tear_down(db).await;
}
