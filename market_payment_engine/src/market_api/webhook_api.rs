use std::fmt::Debug;

use log::*;

use crate::{
    db_types::NewWebhookEvent,
    market_api::{
        errors::WebhookError,
        order_flow_api::OrderFlowApi,
        webhook_objects::{PaymentEvent, PaymentEventKind, WebhookOutcome},
    },
    traits::{PaymentLedgerDatabase, WebhookEventLog},
};

/// The push side of reconciliation. Provider notifications are delivered at least once and in any order; every
/// delivery is logged, and a delivery that was already processed is acknowledged without doing anything.
pub struct WebhookApi<B> {
    orders: OrderFlowApi<B>,
}

impl<B> Debug for WebhookApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookApi")
    }
}

impl<B> WebhookApi<B> {
    pub fn new(orders: OrderFlowApi<B>) -> Self {
        Self { orders }
    }
}

impl<B> WebhookApi<B>
where B: PaymentLedgerDatabase + WebhookEventLog
{
    /// Handles one verified notification.
    ///
    /// The event is only marked processed once its effect has been applied. If anything fails in between, the error is
    /// returned so that the provider redelivers, and the redelivery is processed in full.
    pub async fn handle_event(&self, event: PaymentEvent) -> Result<WebhookOutcome, WebhookError> {
        let PaymentEvent { event_id, event_type, payload, kind } = event;
        let new_event = NewWebhookEvent { event_id: event_id.clone(), event_type: event_type.clone(), payload };
        let record = self.orders.db().record_event(new_event).await?;
        if record.processed {
            info!("🪝️ Event {event_id} ({event_type}) was already processed. Ignoring the redelivery");
            return Ok(WebhookOutcome::Duplicate { event_id });
        }
        debug!("🪝️ Processing event {event_id} ({event_type})");
        let outcome = match kind {
            PaymentEventKind::CheckoutCompleted(completion) => {
                let outcome = self.orders.apply_completion(completion).await?;
                WebhookOutcome::Completion { outcome }
            },
            PaymentEventKind::CheckoutExpired { session_id } => {
                let order = self.orders.fail_order_for_session(&session_id, "checkout session expired").await?;
                WebhookOutcome::Expired { order }
            },
            PaymentEventKind::PaymentSucceeded { payment_reference, charge_reference } => match charge_reference {
                Some(charge) => {
                    let payment = self.orders.fill_charge_reference(&payment_reference, &charge).await?;
                    WebhookOutcome::ChargeRecorded { payment }
                },
                None => {
                    debug!("🪝️ Payment {payment_reference} succeeded without a charge reference");
                    WebhookOutcome::ChargeRecorded { payment: None }
                },
            },
            PaymentEventKind::Other => {
                debug!("🪝️ Unhandled event type: {event_type}");
                WebhookOutcome::Ignored { event_type }
            },
        };
        self.orders.db().mark_event_processed(&event_id).await?;
        trace!("🪝️ Event {event_id} processed. {}", outcome.message());
        Ok(outcome)
    }
}
