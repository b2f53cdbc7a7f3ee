use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// A report, from either reconciliation path, that the checkout session `session_id` has been paid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    pub session_id: String,
    /// The provider's payment intent id
    pub payment_reference: Option<String>,
    pub charge_reference: Option<String>,
    /// The provider object that reported the completion, kept verbatim on the payment record
    pub raw_payload: Option<String>,
}

impl Completion {
    pub fn new<S: Into<String>>(session_id: S) -> Self {
        Self { session_id: session_id.into(), ..Default::default() }
    }

    pub fn with_payment_reference<S: Into<String>>(mut self, reference: Option<S>) -> Self {
        self.payment_reference = reference.map(Into::into);
        self
    }

    pub fn with_charge_reference<S: Into<String>>(mut self, reference: Option<S>) -> Self {
        self.charge_reference = reference.map(Into::into);
        self
    }

    pub fn with_raw_payload<S: Into<String>>(mut self, payload: S) -> Self {
        self.raw_payload = Some(payload.into());
        self
    }
}

/// The result of applying a [`Completion`] to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// This call performed the `PENDING -> PAID` transition and wrote the payment record.
    Paid { order: Order, payment: Payment },
    /// The order was already paid. Nothing changed.
    AlreadyPaid { order: Order },
    /// The order is in a terminal state other than `PAID` and cannot be paid any more. Nothing changed.
    NotPayable { order: Order },
    /// No order is bound to the session.
    NotFound,
}

impl CompletionOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            CompletionOutcome::Paid { order, .. } => Some(order),
            CompletionOutcome::AlreadyPaid { order } => Some(order),
            CompletionOutcome::NotPayable { order } => Some(order),
            CompletionOutcome::NotFound => None,
        }
    }

    pub fn is_newly_paid(&self) -> bool {
        matches!(self, CompletionOutcome::Paid { .. })
    }
}
