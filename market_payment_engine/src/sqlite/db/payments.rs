use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment},
    traits::LedgerError,
};

/// Writes the payment record for an order. There can only be one per order; a second attempt is reported as
/// [`LedgerError::PaymentAlreadyExists`].
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, LedgerError> {
    let order_id = payment.order_id;
    let now = Utc::now();
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                external_payment_reference,
                external_charge_reference,
                amount,
                currency,
                successful,
                created_at,
                processed_at,
                raw_payload
            ) VALUES ($1, $2, $3, $4, $5, 1, $6, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.external_payment_reference)
    .bind(payment.external_charge_reference)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(now)
    .bind(payment.raw_payload)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::PaymentAlreadyExists(order_id),
        _ => LedgerError::from(e),
    })?;
    debug!("🗃️ Payment #{} of {} {} recorded for order #{order_id}", payment.id, payment.amount, payment.currency);
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fill_charge_reference(
    payment_reference: &str,
    charge_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE payments SET external_charge_reference = $1 WHERE external_payment_reference = $2 RETURNING *",
    )
    .bind(charge_reference)
    .bind(payment_reference)
    .fetch_optional(conn)
    .await
}
