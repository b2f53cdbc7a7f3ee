use std::{fmt::Debug, time::Instant};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::Order,
    market_api::{
        order_flow_api::OrderFlowApi,
        poll_objects::{PollAction, PollOptions, PollOutcome, PollSummary},
    },
    traits::{Completion, CompletionOutcome, LedgerError, PaymentLedgerDatabase, PaymentProvider, SessionState},
};

/// The pull side of reconciliation: asks the provider about recent pending orders, for deployments where webhooks
/// cannot reach the server (or as a safety net when they can).
///
/// Errors for one order are logged and counted, and never stop the run.
pub struct PaymentPoller<B, P> {
    orders: OrderFlowApi<B>,
    provider: P,
}

impl<B, P> Debug for PaymentPoller<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentPoller")
    }
}

impl<B, P> PaymentPoller<B, P> {
    pub fn new(orders: OrderFlowApi<B>, provider: P) -> Self {
        Self { orders, provider }
    }
}

impl<B, P> PaymentPoller<B, P>
where
    B: PaymentLedgerDatabase,
    P: PaymentProvider,
{
    pub async fn run(&self, options: PollOptions) -> Result<PollSummary, LedgerError> {
        let start = Instant::now();
        let since = Utc::now().checked_sub_signed(options.max_age).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let candidates = self.orders.db().fetch_pollable_orders(since, options.max_orders).await?;
        info!(
            "🕰️ Polling {} pending orders created since {since}{}",
            candidates.len(),
            if options.dry_run { " (dry run)" } else { "" }
        );
        let mut summary = PollSummary::default();
        for (i, order) in candidates.iter().enumerate() {
            let Some(session_id) = order.external_session_id.clone() else {
                continue;
            };
            if options.dry_run {
                info!("🕰️ Would poll Order #{} ({session_id})", order.id);
                summary.record(PollOutcome { order_id: order.id, session_id, action: PollAction::WouldPoll });
                continue;
            }
            if i > 0 && !options.delay.is_zero() {
                tokio::time::sleep(options.delay).await;
            }
            let action = match self.poll_order(order, &session_id).await {
                Ok(action) => action,
                Err(message) => {
                    error!("🕰️ Error polling Order #{} ({session_id}): {message}", order.id);
                    PollAction::Error { message }
                },
            };
            summary.record(PollOutcome { order_id: order.id, session_id, action });
        }
        summary.elapsed = start.elapsed();
        info!(
            "🕰️ Completed: {} checked, {} updated, {} errors in {:.2}s",
            summary.checked,
            summary.updated,
            summary.errors,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    async fn poll_order(&self, order: &Order, session_id: &str) -> Result<PollAction, String> {
        let db = self.orders.db();
        db.record_poll_attempt(order.id).await.map_err(|e| e.to_string())?;
        let snapshot = self.provider.fetch_session(session_id).await.map_err(|e| e.to_string())?;
        if snapshot.paid {
            let completion = Completion::new(session_id)
                .with_payment_reference(snapshot.payment_reference)
                .with_charge_reference(snapshot.charge_reference)
                .with_raw_payload(snapshot.raw.to_string());
            let outcome = self.orders.apply_completion(completion).await.map_err(|e| e.to_string())?;
            let action = match outcome {
                CompletionOutcome::Paid { .. } => {
                    info!("🕰️ Order #{} marked as PAID", order.id);
                    PollAction::MarkedPaid
                },
                CompletionOutcome::NotPayable { order } => PollAction::NotPayable { status: order.status.to_string() },
                _ => PollAction::AlreadySettled,
            };
            return Ok(action);
        }
        if snapshot.state == SessionState::Expired {
            let failed = self.orders.fail_order(order.id, "checkout session expired").await.map_err(|e| e.to_string())?;
            let action = match failed {
                Some(_) => {
                    info!("🕰️ Order #{} marked as FAILED (session expired)", order.id);
                    PollAction::MarkedFailed
                },
                None => PollAction::AlreadySettled,
            };
            return Ok(action);
        }
        let state = format!("{:?}", snapshot.state).to_lowercase();
        trace!("🕰️ Order #{} still pending (session {state})", order.id);
        Ok(PollAction::Unchanged { state })
    }
}
