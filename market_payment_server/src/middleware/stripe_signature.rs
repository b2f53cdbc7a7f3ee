//! Stripe webhook signature middleware for Actix Web.
//!
//! Stripe signs every webhook delivery with the endpoint's signing secret. The signature is sent in the
//! `Stripe-Signature` header as `t=<unix time>,v1=<hex hmac>`, where the HMAC-SHA256 is computed over
//! `"<t>.<raw body>"`.
//!
//! Wrap the webhook routes with this middleware. Requests that fail verification are rejected with a 400 before the
//! handler (and hence the database) is reached. Verified requests have their body restored so that the handler can
//! read it again.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorBadRequest,
    web,
    Error,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use mkt_common::Secret;
use stripe_tools::{verify_signature, SIGNATURE_HEADER};

pub struct StripeSignatureMiddlewareFactory {
    secret: Secret<String>,
    tolerance_secs: i64,
}

impl StripeSignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>, tolerance_secs: i64) -> Self {
        StripeSignatureMiddlewareFactory { secret, tolerance_secs }
    }
}

impl<S, B> Transform<S, ServiceRequest> for StripeSignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = StripeSignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StripeSignatureMiddlewareService {
            secret: self.secret.clone(),
            tolerance_secs: self.tolerance_secs,
            service: Rc::new(service),
        }))
    }
}

pub struct StripeSignatureMiddlewareService<S> {
    secret: Secret<String>,
    tolerance_secs: i64,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for StripeSignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let tolerance_secs = self.tolerance_secs;
        Box::pin(async move {
            trace!("🔐️ Checking Stripe signature for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let header = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    warn!("🔐️ No Stripe signature found in webhook request. Denying access.");
                    ErrorBadRequest("No Stripe signature found.")
                })?
                .to_string();
            match verify_signature(data.as_ref(), &header, &secret, tolerance_secs, Utc::now().timestamp()) {
                Ok(()) => {
                    trace!("🔐️ Stripe signature check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Invalid Stripe signature in webhook request. {e}. Denying access.");
                    Err(ErrorBadRequest("Invalid Stripe signature."))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
