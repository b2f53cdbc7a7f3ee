use crate::{
    db_types::{NewWebhookEvent, WebhookEvent},
    traits::LedgerError,
};

#[allow(async_fn_in_trait)]
pub trait WebhookEventLog: Clone {
    /// Inserts the event if its `event_id` has not been seen before. Either way the stored record is returned, so the
    /// caller can tell from `processed` whether this is a replay of a handled delivery.
    async fn record_event(&self, event: NewWebhookEvent) -> Result<WebhookEvent, LedgerError>;

    async fn mark_event_processed(&self, event_id: &str) -> Result<WebhookEvent, LedgerError>;

    async fn fetch_event(&self, event_id: &str) -> Result<Option<WebhookEvent>, LedgerError>;
}
