//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async, and all database and provider calls
//! are awaited, so workers keep serving other requests while they wait.
//!
//! Routes under `/api` identify the caller with the `X-Market-User-Id` header, which the upstream auth gateway sets.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use market_payment_engine::{
    db_types::NewOffer,
    traits::{CompletionOutcome, OfferManagement, PaymentLedgerDatabase, PaymentProvider, WebhookEventLog},
    CheckoutApi,
    OfferApi,
    OrderFlowApi,
    PayableTarget,
    WebhookApi,
    WebhookOutcome,
};

use crate::{
    data_objects::{CheckoutRedirects, ConversationQuery, JsonResponse, OfferRequest, OfferStatusUpdate},
    errors::ServerError,
    helpers::caller_id,
    integrations::stripe::payment_event_from_stripe,
};

/// Everything the HTTP API needs from a backend.
pub trait MarketBackend: PaymentLedgerDatabase + OfferManagement + WebhookEventLog {}

impl<T> MarketBackend for T where T: PaymentLedgerDatabase + OfferManagement + WebhookEventLog {}

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(stripe_webhook => Post "/stripe" impl MarketBackend);
/// Route handler for Stripe webhook deliveries.
///
/// The signature has already been checked by the middleware wrapping this route. Anything the ledger treats as a
/// benign no-op (duplicates, unknown sessions, unhandled event types) is acknowledged with a 200 so that Stripe does not
/// retry. Internal faults return a 500, and Stripe will deliver the event again later.
pub async fn stripe_webhook<B: MarketBackend>(
    body: web::Bytes,
    api: web::Data<WebhookApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = std::str::from_utf8(body.as_ref()).map_err(|e| ServerError::InvalidWebhook(e.to_string()))?;
    let event = payment_event_from_stripe(payload).map_err(|e| {
        warn!("💻️ Could not parse Stripe webhook. {e}");
        ServerError::InvalidWebhook(e.to_string())
    })?;
    info!("💻️ Received Stripe event {} ({})", event.event_id, event.event_type);
    let outcome = api.handle_event(event).await?;
    let response = match &outcome {
        WebhookOutcome::Completion { outcome: CompletionOutcome::NotFound } |
        WebhookOutcome::Completion { outcome: CompletionOutcome::NotPayable { .. } } => {
            JsonResponse::failure(outcome.message())
        },
        _ => JsonResponse::success(outcome.message()),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(product_checkout => Post "/products/{id}/checkout" impl MarketBackend, PaymentProvider);
pub async fn product_checkout<B, P>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CheckoutRedirects>,
    api: web::Data<CheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketBackend,
    P: PaymentProvider,
{
    let buyer_id = caller_id(&req)?;
    let product_id = path.into_inner();
    debug!("💻️ POST checkout for product {product_id} by user {buyer_id}");
    let params = body.into_inner().into_params(buyer_id);
    let session = api.create_checkout(PayableTarget::Direct { product_id }, params).await?;
    Ok(HttpResponse::Created().json(session))
}

route!(offer_checkout => Post "/offers/{id}/payment" impl MarketBackend, PaymentProvider);
pub async fn offer_checkout<B, P>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CheckoutRedirects>,
    api: web::Data<CheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketBackend,
    P: PaymentProvider,
{
    let buyer_id = caller_id(&req)?;
    let offer_id = path.into_inner();
    debug!("💻️ POST checkout for offer {offer_id} by user {buyer_id}");
    let params = body.into_inner().into_params(buyer_id);
    let session = api.create_checkout(PayableTarget::Negotiated { offer_id }, params).await?;
    Ok(HttpResponse::Created().json(session))
}

//----------------------------------------------   Offers  ----------------------------------------------------
route!(create_offer => Post "/offers" impl MarketBackend);
pub async fn create_offer<B: MarketBackend>(
    req: HttpRequest,
    body: web::Json<OfferRequest>,
    api: web::Data<OfferApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = caller_id(&req)?;
    let OfferRequest { conversation_id, product_id, amount } = body.into_inner();
    debug!("💻️ POST offer of {amount} on product {product_id} by user {buyer_id}");
    let offer = api.create_offer(NewOffer { conversation_id, product_id, buyer_id, amount }).await?;
    Ok(HttpResponse::Created().json(offer))
}

route!(update_offer => Patch "/offers/{id}" impl MarketBackend);
pub async fn update_offer<B: MarketBackend>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<OfferStatusUpdate>,
    api: web::Data<OfferApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    let offer_id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PATCH offer {offer_id} to {status} by user {user_id}");
    let offer = api.update_offer_status(offer_id, user_id, status).await?;
    Ok(HttpResponse::Ok().json(offer))
}

route!(offer_by_id => Get "/offers/{id}" impl MarketBackend);
pub async fn offer_by_id<B: MarketBackend>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<OfferApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    let offer = api.fetch_offer(path.into_inner(), user_id).await?;
    Ok(HttpResponse::Ok().json(offer))
}

route!(conversation_offers => Get "/offers" impl MarketBackend);
pub async fn conversation_offers<B: MarketBackend>(
    req: HttpRequest,
    query: web::Query<ConversationQuery>,
    api: web::Data<OfferApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    let conversation_id = query.into_inner().conversation_id;
    trace!("💻️ GET offers in conversation {conversation_id} for user {user_id}");
    let offers = api.offers_for_conversation(conversation_id, user_id).await?;
    Ok(HttpResponse::Ok().json(offers))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl MarketBackend);
pub async fn my_orders<B: MarketBackend>(
    req: HttpRequest,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    trace!("💻️ GET orders for user {user_id}");
    let orders = api.orders_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl MarketBackend);
pub async fn order_by_id<B: MarketBackend>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    let order = api.fetch_order(path.into_inner(), user_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl MarketBackend);
pub async fn cancel_order<B: MarketBackend>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = caller_id(&req)?;
    let order_id = path.into_inner();
    debug!("💻️ POST cancel order {order_id} by user {user_id}");
    let order = api.cancel_order(order_id, user_id).await?;
    Ok(HttpResponse::Ok().json(order))
}
