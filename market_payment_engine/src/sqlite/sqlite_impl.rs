//! `SqliteDatabase` is a concrete implementation of a marketplace payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{db_url, new_pool, offers, orders, payments, products, webhook_events};
use crate::{
    db_types::{
        NewOffer,
        NewOrder,
        NewPayment,
        NewProduct,
        NewWebhookEvent,
        Offer,
        OfferStatus,
        Order,
        OrderStatusType,
        Payment,
        Product,
        WebhookEvent,
    },
    traits::{
        Completion,
        CompletionOutcome,
        LedgerError,
        OfferManagement,
        PaymentLedgerDatabase,
        ProductCatalog,
        WebhookEventLog,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl PaymentLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn attach_session_id(&self, order_id: i64, session_id: &str) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::attach_session_id(order_id, session_id, &mut tx).await?;
        tx.commit().await?;
        order.ok_or(LedgerError::OrderNotFound(order_id))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_session_id(&self, session_id: &str) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_session_id(session_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    /// The whole completion runs inside one transaction whose first statement is the compare-and-set `UPDATE`. SQLite
    /// takes the write lock on that statement, so a concurrent caller for the same session waits (up to the busy
    /// timeout) until this transaction ends and then finds the order already paid.
    ///
    /// If the future is dropped part way through, the transaction guard rolls everything back.
    async fn complete_order_payment(&self, completion: &Completion) -> Result<CompletionOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let outcome = apply_completion(completion, &mut tx).await.map_err(|e| {
            error!("🗃️ Completion for {} failed and will be rolled back. {e}", completion.session_id);
            e
        })?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn close_pending_order(&self, order_id: i64, status: OrderStatusType) -> Result<Option<Order>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::close_if_pending(order_id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_pollable_orders(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pollable_orders(since, limit, &mut conn).await?;
        Ok(orders)
    }

    async fn record_poll_attempt(&self, order_id: i64) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::record_poll_attempt(order_id, &mut tx).await?;
        tx.commit().await?;
        order.ok_or(LedgerError::OrderNotFound(order_id))
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fill_charge_reference(
        &self,
        payment_reference: &str,
        charge_reference: &str,
    ) -> Result<Option<Payment>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fill_charge_reference(payment_reference, charge_reference, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }
}

impl OfferManagement for SqliteDatabase {
    async fn insert_offer(&self, offer: NewOffer, seller_id: i64) -> Result<Offer, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let offer = offers::insert_offer(offer, seller_id, &mut tx).await?;
        tx.commit().await?;
        Ok(offer)
    }

    async fn fetch_offer(&self, offer_id: i64) -> Result<Option<Offer>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::fetch_offer(offer_id, &mut conn).await?;
        Ok(offer)
    }

    async fn transition_offer(
        &self,
        offer_id: i64,
        from: OfferStatus,
        to: OfferStatus,
    ) -> Result<Option<Offer>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let offer = offers::transition_offer(offer_id, from, to, &mut tx).await?;
        tx.commit().await?;
        Ok(offer)
    }

    async fn fetch_offers_for_conversation(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> Result<Vec<Offer>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let offers = offers::fetch_offers_for_conversation(conversation_id, user_id, &mut conn).await?;
        Ok(offers)
    }
}

impl WebhookEventLog for SqliteDatabase {
    async fn record_event(&self, event: NewWebhookEvent) -> Result<WebhookEvent, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let event = webhook_events::insert_if_absent(event, &mut tx).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<WebhookEvent, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let event = webhook_events::mark_processed(event_id, &mut tx).await?;
        tx.commit().await?;
        event.ok_or_else(|| LedgerError::EventNotFound(event_id.to_string()))
    }

    async fn fetch_event(&self, event_id: &str) -> Result<Option<WebhookEvent>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let event = webhook_events::fetch_event(event_id, &mut conn).await?;
        Ok(event)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

/// The body of [`PaymentLedgerDatabase::complete_order_payment`]. The caller owns the transaction.
async fn apply_completion(
    completion: &Completion,
    conn: &mut SqliteConnection,
) -> Result<CompletionOutcome, LedgerError> {
    let session_id = completion.session_id.as_str();
    let order = match orders::mark_paid_if_pending(session_id, conn).await? {
        Some(order) => order,
        None => {
            let outcome = match orders::fetch_order_by_session_id(session_id, conn).await? {
                None => CompletionOutcome::NotFound,
                Some(order) if order.status == OrderStatusType::Paid => CompletionOutcome::AlreadyPaid { order },
                Some(order) => CompletionOutcome::NotPayable { order },
            };
            return Ok(outcome);
        },
    };
    debug!("🗃️ Order #{} marked as paid (session {session_id})", order.id);
    match products::mark_sold(order.product_id, order.buyer_id, conn).await? {
        Some(product) => debug!("🗃️ Product #{} sold to buyer {}", product.id, order.buyer_id),
        None => warn!(
            "🗃️ Product #{} was not available when order #{} was paid. The order stands, but this needs a human to \
             look at it.",
            order.product_id, order.id
        ),
    }
    if let Some(offer_id) = order.offer_id {
        match offers::transition_offer(offer_id, OfferStatus::Accepted, OfferStatus::Paid, conn).await? {
            Some(_) => debug!("🗃️ Offer #{offer_id} marked as paid"),
            None => warn!("🗃️ Offer #{offer_id} for order #{} was not in the accepted state", order.id),
        }
    }
    let new_payment = NewPayment {
        order_id: order.id,
        external_payment_reference: completion.payment_reference.clone(),
        external_charge_reference: completion.charge_reference.clone(),
        amount: order.price,
        currency: order.currency.clone(),
        raw_payload: completion.raw_payload.clone(),
    };
    let payment = payments::insert_payment(new_payment, conn).await?;
    Ok(CompletionOutcome::Paid { order, payment })
}
