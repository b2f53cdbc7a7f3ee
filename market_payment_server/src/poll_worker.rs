use std::time::Duration;

use log::*;
use market_payment_engine::{
    traits::{PaymentLedgerDatabase, PaymentProvider},
    OrderFlowApi,
    PaymentPoller,
    PollOptions,
};
use tokio::task::JoinHandle;

/// Starts the payment poller worker on the current (actix) local task set. Do not await the returned JoinHandle, as it
/// will run indefinitely.
///
/// The worker is for deployments where Stripe webhooks cannot reach the server. It is safe to run alongside webhooks:
/// both paths apply completions through the same idempotent ledger operation.
pub fn start_poll_worker<B, P>(
    orders: OrderFlowApi<B>,
    provider: P,
    interval: Duration,
    options: PollOptions,
) -> JoinHandle<()>
where
    B: PaymentLedgerDatabase + 'static,
    P: PaymentProvider + 'static,
{
    tokio::task::spawn_local(async move {
        let mut timer = tokio::time::interval(interval);
        let poller = PaymentPoller::new(orders, provider);
        info!("🕰️ Payment poll worker started. Polling every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            info!("🕰️ Running payment poll job");
            match poller.run(options).await {
                Ok(summary) => {
                    debug!("🕰️ {} orders checked, {} updated", summary.checked, summary.updated);
                    if summary.errors > 0 {
                        warn!("🕰️ {} orders could not be polled. They will be retried on the next run", summary.errors);
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running payment poll job: {e}");
                },
            }
        }
    })
}
