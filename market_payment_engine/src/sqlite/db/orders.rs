use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    traits::LedgerError,
};

/// Inserts a new order with status `Pending`. This is not atomic. You can embed this call inside a transaction if you
/// need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                product_id,
                buyer_id,
                seller_id,
                offer_id,
                price,
                platform_fee,
                seller_amount,
                currency,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Pending', $9, $9)
            RETURNING *;
        "#,
    )
    .bind(order.product_id)
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.offer_id)
    .bind(order.price)
    .bind(order.platform_fee)
    .bind(order.seller_amount)
    .bind(order.currency)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} inserted for product #{} at {}", order.id, order.product_id, order.price);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_by_session_id(
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE external_session_id = $1").bind(session_id).fetch_optional(conn).await
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 OR seller_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

/// Binds a checkout session to the order. Returns `None` if the order does not exist.
pub async fn attach_session_id(
    id: i64,
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let result = sqlx::query_as("UPDATE orders SET external_session_id = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(session_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                LedgerError::SessionAlreadyAssigned(session_id.to_string())
            },
            e => LedgerError::from(e),
        })?;
    Ok(result)
}

/// The compare-and-set at the centre of payment reconciliation. Only a `Pending` order is moved to `Paid`; for any
/// other state no row is touched and `None` is returned.
pub async fn mark_paid_if_pending(
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let now = Utc::now();
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'Paid', paid_at = $1, updated_at = $1
            WHERE external_session_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(session_id)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Pending->Paid for session {session_id}: {}", if order.is_some() { "applied" } else { "no-op" });
    Ok(order)
}

/// Moves a `Pending` order into `status`. Returns `None` if the order was not pending.
pub async fn close_if_pending(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = 'Pending' RETURNING *")
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_pollable_orders(
    since: DateTime<Utc>,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'Pending' AND external_session_id IS NOT NULL AND created_at >= $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2;
        "#,
    )
    .bind(since)
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} pollable orders created since {since}", orders.len());
    Ok(orders)
}

pub async fn record_poll_attempt(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET poll_count = poll_count + 1, last_polled_at = $1 WHERE id = $2 RETURNING *")
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await
}
