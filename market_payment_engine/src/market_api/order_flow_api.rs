use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType, Payment},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    market_api::errors::OrderFlowError,
    traits::{Completion, CompletionOutcome, LedgerError, PaymentLedgerDatabase},
};

/// `OrderFlowApi` is the order ledger. Both reconciliation paths (webhooks and the poller) report completions here, and
/// this is the only place orders change state.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentLedgerDatabase
{
    /// Applies a payment completion for a checkout session. Safe to call any number of times, from any number of
    /// callers: only the first call against a pending order changes anything.
    ///
    /// * Unknown session: [`CompletionOutcome::NotFound`]. Provider events can outrun our own writes, so this is not
    ///   an error.
    /// * Already paid: [`CompletionOutcome::AlreadyPaid`].
    /// * Failed or cancelled: [`CompletionOutcome::NotPayable`]. The buyer has been charged for an order we had given
    ///   up on, so this is logged loudly for manual follow-up.
    pub async fn apply_completion(&self, completion: Completion) -> Result<CompletionOutcome, LedgerError> {
        let session_id = completion.session_id.clone();
        let outcome = self.db.complete_order_payment(&completion).await?;
        match &outcome {
            CompletionOutcome::Paid { order, payment } => {
                info!("🔄️💰️ Order #{} is paid ({} {}). Session {session_id}", order.id, payment.amount, payment.currency);
                self.call_order_paid_hook(order, payment).await;
            },
            CompletionOutcome::AlreadyPaid { order } => {
                debug!("🔄️💰️ Order #{} was already paid. Completion for {session_id} ignored", order.id);
            },
            CompletionOutcome::NotPayable { order } => {
                error!(
                    "🔄️💰️ Session {session_id} reports a payment for order #{}, which is {}. The payment has NOT been \
                     applied and needs manual attention (refund or re-open).",
                    order.id, order.status
                );
            },
            CompletionOutcome::NotFound => {
                warn!("🔄️💰️ No order is bound to session {session_id}. Completion ignored");
            },
        }
        Ok(outcome)
    }

    async fn call_order_paid_hook(&self, order: &Order, payment: &Payment) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone(), payment.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    /// Marks a pending order as failed. Returns `None` if the order was no longer pending, in which case nothing changed.
    pub async fn fail_order(&self, order_id: i64, reason: &str) -> Result<Option<Order>, LedgerError> {
        let result = self.db.close_pending_order(order_id, OrderStatusType::Failed).await?;
        match &result {
            Some(order) => {
                info!("🔄️❌️ Order #{order_id} failed. {reason}");
                self.call_order_annulled_hook(order).await;
            },
            None => debug!("🔄️❌️ Order #{order_id} was not pending. Not marking it as failed ({reason})"),
        }
        Ok(result)
    }

    /// Marks the pending order bound to the session as failed. Returns `None` if there is no such pending order.
    pub async fn fail_order_for_session(&self, session_id: &str, reason: &str) -> Result<Option<Order>, LedgerError> {
        match self.db.fetch_order_by_session_id(session_id).await? {
            Some(order) => self.fail_order(order.id, reason).await,
            None => {
                debug!("🔄️❌️ No order is bound to session {session_id}. Nothing to fail");
                Ok(None)
            },
        }
    }

    /// The buyer abandons a pending order.
    pub async fn cancel_order(&self, order_id: i64, buyer_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.buyer_id != buyer_id {
            return Err(OrderFlowError::Forbidden(format!("Only the buyer can cancel order {order_id}")));
        }
        let cancelled = self.db.close_pending_order(order_id, OrderStatusType::Cancelled).await?;
        match cancelled {
            Some(order) => {
                info!("🔄️❌️ Order #{order_id} cancelled by the buyer");
                self.call_order_annulled_hook(&order).await;
                Ok(order)
            },
            None => {
                let status = self.db.fetch_order(order_id).await?.map(|o| o.status).unwrap_or(order.status);
                Err(OrderFlowError::NotPending { order_id, status })
            },
        }
    }

    /// Fetches an order on behalf of a user. Only the buyer and the seller may see it.
    pub async fn fetch_order(&self, order_id: i64, user_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !order.involves(user_id) {
            return Err(OrderFlowError::Forbidden(format!("Order {order_id} belongs to someone else")));
        }
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Records the charge id on the payment made through `payment_reference`. A payment that does not exist yet is not
    /// an error: the charge notification may arrive before the completion.
    pub async fn fill_charge_reference(
        &self,
        payment_reference: &str,
        charge_reference: &str,
    ) -> Result<Option<Payment>, LedgerError> {
        let payment = self.db.fill_charge_reference(payment_reference, charge_reference).await?;
        match &payment {
            Some(p) => debug!("🔄️💰️ Charge {charge_reference} recorded on payment #{}", p.id),
            None => debug!("🔄️💰️ No payment for {payment_reference} yet. Charge {charge_reference} not recorded"),
        }
        Ok(payment)
    }
}
