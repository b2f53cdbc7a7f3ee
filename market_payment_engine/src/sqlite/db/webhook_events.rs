use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWebhookEvent, WebhookEvent},
    traits::LedgerError,
};

/// Stores the event unless an event with the same id already exists, and returns the stored record.
pub async fn insert_if_absent(
    event: NewWebhookEvent,
    conn: &mut SqliteConnection,
) -> Result<WebhookEvent, LedgerError> {
    let inserted = sqlx::query(
        r#"
            INSERT INTO webhook_events (event_id, event_type, payload, processed, created_at)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (event_id) DO NOTHING;
        "#,
    )
    .bind(&event.event_id)
    .bind(&event.event_type)
    .bind(&event.payload)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .rows_affected();
    trace!("🗃️ Webhook event {} ({}) recorded: {}", event.event_id, event.event_type, inserted > 0);
    fetch_event(&event.event_id, conn).await?.ok_or(LedgerError::EventNotFound(event.event_id))
}

pub async fn fetch_event(event_id: &str, conn: &mut SqliteConnection) -> Result<Option<WebhookEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM webhook_events WHERE event_id = $1").bind(event_id).fetch_optional(conn).await
}

pub async fn mark_processed(event_id: &str, conn: &mut SqliteConnection) -> Result<Option<WebhookEvent>, sqlx::Error> {
    sqlx::query_as("UPDATE webhook_events SET processed = 1, processed_at = $1 WHERE event_id = $2 RETURNING *")
        .bind(Utc::now())
        .bind(event_id)
        .fetch_optional(conn)
        .await
}
