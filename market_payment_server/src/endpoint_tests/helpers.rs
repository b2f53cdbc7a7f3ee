use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use log::debug;
use market_payment_engine::{
    db_types::{NewProduct, Product},
    events::EventProducers,
    test_utils::prepare_env::fresh_database,
    traits::ProductCatalog,
    CheckoutApi,
    OfferApi,
    OrderFlowApi,
    SqliteDatabase,
    WebhookApi,
};
use mkt_common::{Money, Secret};
use stripe_tools::{sign_payload, SIGNATURE_HEADER};

use crate::{
    helpers::USER_ID_HEADER,
    middleware::StripeSignatureMiddlewareFactory,
    routes::StripeWebhookRoute,
};

pub const SELLER: i64 = 10;
pub const BUYER: i64 = 20;
pub const STRANGER: i64 = 99;
pub const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

pub async fn seeded_database() -> (SqliteDatabase, Product) {
    let db = fresh_database().await;
    let product = db
        .insert_product(NewProduct::new(SELLER, "Vintage camera", Money::from_units(120)))
        .await
        .expect("Error inserting product");
    (db, product)
}

/// Registers the engine APIs for `db` in the test app.
pub fn engine_data<P: 'static>(cfg: &mut ServiceConfig, db: &SqliteDatabase, provider: P) {
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    cfg.app_data(web::Data::new(CheckoutApi::new(db.clone(), provider, EventProducers::default())))
        .app_data(web::Data::new(OfferApi::new(db.clone())))
        .app_data(web::Data::new(WebhookApi::new(orders.clone())))
        .app_data(web::Data::new(orders));
}

pub fn webhook_scope(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/webhooks")
            .wrap(StripeSignatureMiddlewareFactory::new(Secret::new(WEBHOOK_SECRET.to_string()), 300))
            .service(StripeWebhookRoute::<SqliteDatabase>::new()),
    );
}

pub fn as_user(req: TestRequest, user_id: i64) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id.to_string()))
}

pub fn signed_webhook(payload: &str) -> TestRequest {
    let signature = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp())
        .expect("Error signing payload");
    TestRequest::post()
        .uri("/webhooks/stripe")
        .insert_header((SIGNATURE_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload.to_string())
}

/// Sends a single request through an app configured by `configure`. Errors raised by middleware are rendered the way
/// the server would render them.
pub async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
