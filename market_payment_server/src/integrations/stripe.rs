//! Stripe as the marketplace's payment provider.
//!
//! [`StripeProvider`] adapts [`StripeApi`] to the engine's [`PaymentProvider`] trait, and
//! [`payment_event_from_stripe`] translates Stripe webhook events into the engine's [`PaymentEvent`]s.
use log::*;
use market_payment_engine::{
    traits::{CheckoutRequest, Completion, PaymentProvider, ProviderError, ProviderSession, SessionSnapshot, SessionState},
    PaymentEvent,
    PaymentEventKind,
};
use stripe_tools::{
    CheckoutSession,
    NewCheckoutSession,
    PaymentIntent,
    SessionPaymentStatus,
    SessionStatus,
    StripeApi,
    StripeApiError,
    StripeEvent,
};
use thiserror::Error;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_EXPIRED: &str = "checkout.session.expired";
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Clone)]
pub struct StripeProvider {
    api: StripeApi,
}

impl StripeProvider {
    pub fn new(api: StripeApi) -> Self {
        Self { api }
    }
}

impl PaymentProvider for StripeProvider {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<ProviderSession, ProviderError> {
        let session = new_checkout_session(request);
        let result = self.api.create_checkout_session(&session).await.map_err(provider_error)?;
        Ok(ProviderSession { session_id: result.id, url: result.url })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError> {
        let session = self.api.retrieve_checkout_session(session_id).await.map_err(provider_error)?;
        snapshot_from_session(session)
    }
}

pub fn new_checkout_session(request: &CheckoutRequest) -> NewCheckoutSession {
    NewCheckoutSession {
        product_name: request.product_name.clone(),
        product_description: request.description.clone(),
        unit_amount: request.amount.cents(),
        currency: request.currency.clone(),
        customer_email: request.customer_email.clone(),
        success_url: request.success_url.clone(),
        cancel_url: request.cancel_url.clone(),
        metadata: request.metadata(),
    }
}

pub fn snapshot_from_session(session: CheckoutSession) -> Result<SessionSnapshot, ProviderError> {
    let state = match session.status {
        Some(SessionStatus::Complete) => SessionState::Complete,
        Some(SessionStatus::Expired) => SessionState::Expired,
        Some(SessionStatus::Open) | None => SessionState::Open,
    };
    let raw = serde_json::to_value(&session).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    Ok(SessionSnapshot {
        session_id: session.id.clone(),
        state,
        paid: session.payment_status == SessionPaymentStatus::Paid,
        payment_reference: session.payment_intent_id().map(String::from),
        charge_reference: session.charge_id().map(String::from),
        raw,
    })
}

fn provider_error(e: StripeApiError) -> ProviderError {
    match e {
        StripeApiError::QueryError { status, message } => ProviderError::Rejected { status, message },
        StripeApiError::JsonError(s) => ProviderError::InvalidResponse(s),
        e => ProviderError::Unavailable(e.to_string()),
    }
}

#[derive(Debug, Clone, Error)]
pub enum EventConversionError {
    #[error("The webhook body is not a Stripe event. {0}")]
    NotAnEvent(String),
    #[error("The {event_type} event does not contain a valid object. {message}")]
    InvalidObject { event_type: String, message: String },
}

/// Parses a verified webhook body into the engine's vocabulary. `payload` is kept verbatim for the event log.
pub fn payment_event_from_stripe(payload: &str) -> Result<PaymentEvent, EventConversionError> {
    let event = serde_json::from_str::<StripeEvent>(payload).map_err(|e| EventConversionError::NotAnEvent(e.to_string()))?;
    let kind = event_kind(&event)?;
    Ok(PaymentEvent { event_id: event.id, event_type: event.event_type, payload: payload.to_string(), kind })
}

fn event_kind(event: &StripeEvent) -> Result<PaymentEventKind, EventConversionError> {
    let invalid = |e: serde_json::Error| EventConversionError::InvalidObject {
        event_type: event.event_type.clone(),
        message: e.to_string(),
    };
    let object = &event.data.object;
    let kind = match event.event_type.as_str() {
        CHECKOUT_COMPLETED => {
            let session = serde_json::from_value::<CheckoutSession>(object.clone()).map_err(invalid)?;
            if session.payment_status != SessionPaymentStatus::Paid {
                warn!("🪝️ Session {} completed with payment status {}", session.id, session.payment_status);
            }
            let completion = Completion::new(session.id.as_str())
                .with_payment_reference(session.payment_intent_id())
                .with_charge_reference(session.charge_id())
                .with_raw_payload(object.to_string());
            PaymentEventKind::CheckoutCompleted(completion)
        },
        CHECKOUT_EXPIRED => {
            let session = serde_json::from_value::<CheckoutSession>(object.clone()).map_err(invalid)?;
            PaymentEventKind::CheckoutExpired { session_id: session.id }
        },
        PAYMENT_INTENT_SUCCEEDED => {
            let intent = serde_json::from_value::<PaymentIntent>(object.clone()).map_err(invalid)?;
            let charge_reference = intent.charge_id().map(String::from);
            PaymentEventKind::PaymentSucceeded { payment_reference: intent.id, charge_reference }
        },
        _ => PaymentEventKind::Other,
    };
    Ok(kind)
}
