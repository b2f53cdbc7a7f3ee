use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, Payment},
    traits::{Completion, CompletionOutcome},
};

/// What a provider notification means for the ledger. Provider integrations translate their own event vocabulary into
/// these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentEventKind {
    /// The buyer finished checkout and paid
    CheckoutCompleted(Completion),
    /// The checkout session timed out without payment
    CheckoutExpired { session_id: String },
    /// The provider captured the funds. Carries the charge id for the payment record
    PaymentSucceeded { payment_reference: String, charge_reference: Option<String> },
    /// Anything we do not act on
    Other,
}

/// A verified provider notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_id: String,
    pub event_type: String,
    /// The raw notification body, stored in the event log
    pub payload: String,
    pub kind: PaymentEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Completion { outcome: CompletionOutcome },
    Expired { order: Option<Order> },
    ChargeRecorded { payment: Option<Payment> },
    Ignored { event_type: String },
    /// The event was delivered before and fully processed then
    Duplicate { event_id: String },
}

impl WebhookOutcome {
    /// A short human-readable summary, returned to the provider in the response body.
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Completion { outcome } => match outcome {
                CompletionOutcome::Paid { order, .. } => format!("Order {} marked as paid", order.id),
                CompletionOutcome::AlreadyPaid { order } => format!("Order {} was already paid", order.id),
                CompletionOutcome::NotPayable { order } => format!("Order {} is {} and was not paid", order.id, order.status),
                CompletionOutcome::NotFound => "Order not found".to_string(),
            },
            WebhookOutcome::Expired { order: Some(order) } => format!("Order {} marked as failed", order.id),
            WebhookOutcome::Expired { order: None } => "No pending order for expired session".to_string(),
            WebhookOutcome::ChargeRecorded { payment: Some(p) } => format!("Charge recorded on payment {}", p.id),
            WebhookOutcome::ChargeRecorded { payment: None } => "Payment not found".to_string(),
            WebhookOutcome::Ignored { event_type } => format!("Unhandled event type: {event_type}"),
            WebhookOutcome::Duplicate { event_id } => format!("Event {event_id} already processed"),
        }
    }
}
