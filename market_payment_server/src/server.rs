use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use market_payment_engine::{
    events::EventProducers,
    CheckoutApi,
    OfferApi,
    OrderFlowApi,
    SqliteDatabase,
    WebhookApi,
};
use stripe_tools::StripeApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::StripeProvider,
    middleware::StripeSignatureMiddlewareFactory,
    poll_worker::start_poll_worker,
    routes::{
        health,
        CancelOrderRoute,
        ConversationOffersRoute,
        CreateOfferRoute,
        MyOrdersRoute,
        OfferByIdRoute,
        OfferCheckoutRoute,
        OrderByIdRoute,
        ProductCheckoutRoute,
        StripeWebhookRoute,
        UpdateOfferRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let api = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let provider = StripeProvider::new(api);
    let producers = EventProducers::default();
    if let Some(interval) = config.poller.interval {
        let orders = OrderFlowApi::new(db.clone(), producers.clone());
        let _worker = start_poll_worker(orders, provider.clone(), interval, config.poller.poll_options());
    }
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: StripeProvider,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    info!("💻️ Pricing new orders in {}", config.stripe.currency);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let checkout_api = CheckoutApi::new(db.clone(), provider.clone(), producers.clone())
            .with_currency(config.stripe.currency.clone());
        let offers_api = OfferApi::new(db.clone());
        let webhook_api = WebhookApi::new(orders_api.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("market::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(offers_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _| ServerError::InvalidRequestBody(err.to_string()).into()),
            )
            .app_data(
                web::PathConfig::default()
                    .error_handler(|err, _| ServerError::InvalidRequestPath(err.to_string()).into()),
            );
        let api_scope = web::scope("/api")
            .service(ProductCheckoutRoute::<SqliteDatabase, StripeProvider>::new())
            .service(OfferCheckoutRoute::<SqliteDatabase, StripeProvider>::new())
            .service(CreateOfferRoute::<SqliteDatabase>::new())
            .service(ConversationOffersRoute::<SqliteDatabase>::new())
            .service(UpdateOfferRoute::<SqliteDatabase>::new())
            .service(OfferByIdRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new());
        let webhook_scope = web::scope("/webhooks")
            .wrap(StripeSignatureMiddlewareFactory::new(
                config.stripe.webhook_secret.clone(),
                config.stripe.signature_tolerance_secs,
            ))
            .service(StripeWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
