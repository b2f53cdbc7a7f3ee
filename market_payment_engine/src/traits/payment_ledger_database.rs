use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, Payment},
    traits::{Completion, CompletionOutcome, ProductCatalog},
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order (id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("The requested product (id {0}) does not exist")]
    ProductNotFound(i64),
    #[error("The requested offer (id {0}) does not exist")]
    OfferNotFound(i64),
    #[error("The checkout session {0} is already bound to another order")]
    SessionAlreadyAssigned(String),
    #[error("Buyer {buyer_id} already has a pending offer on product {product_id}")]
    PendingOfferExists { buyer_id: i64, product_id: i64 },
    #[error("A payment has already been recorded for order {0}")]
    PaymentAlreadyExists(i64),
    #[error("The webhook event {0} has not been recorded")]
    EventNotFound(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the payment engine.
///
/// This behaviour includes:
/// * Creating orders and binding them to provider checkout sessions
/// * Applying payment completions exactly once
/// * Closing out orders that will never be paid
/// * Bookkeeping for the payment poller
#[allow(async_fn_in_trait)]
pub trait PaymentLedgerDatabase: Clone + ProductCatalog {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order with status `Pending`. The order has no checkout session yet.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError>;

    /// Binds the provider checkout session to a pending order.
    ///
    /// Fails with [`LedgerError::SessionAlreadyAssigned`] if another order already carries this session id.
    async fn attach_session_id(&self, order_id: i64, session_id: &str) -> Result<Order, LedgerError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError>;

    async fn fetch_order_by_session_id(&self, session_id: &str) -> Result<Option<Order>, LedgerError>;

    /// All orders where the user is either the buyer or the seller, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;

    /// Applies a payment completion in a single atomic transaction.
    ///
    /// If the order bound to the session is `Pending`, then
    /// * the order moves to `Paid` and `paid_at` is set,
    /// * the product is marked `Sold` to the buyer,
    /// * the correlated offer, if any, moves from `Accepted` to `Paid`,
    /// * a payment record for the order's price snapshot is written.
    ///
    /// The status check and the status change are one conditional write, so of any number of concurrent callers for
    /// the same session exactly one sees [`CompletionOutcome::Paid`]. Every other call is a no-op reported through the
    /// other outcome variants.
    async fn complete_order_payment(&self, completion: &Completion) -> Result<CompletionOutcome, LedgerError>;

    /// Moves a `Pending` order to `status` (one of `Failed` or `Cancelled`).
    ///
    /// Returns `None`, and changes nothing, if the order is not pending any more.
    async fn close_pending_order(&self, order_id: i64, status: OrderStatusType) -> Result<Option<Order>, LedgerError>;

    /// Pending orders that have a checkout session and were created at or after `since`, oldest first.
    async fn fetch_pollable_orders(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Order>, LedgerError>;

    /// Increments `poll_count` and stamps `last_polled_at`.
    async fn record_poll_attempt(&self, order_id: i64) -> Result<Order, LedgerError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, LedgerError>;

    /// Back-fills the charge reference on the payment identified by the provider's payment reference.
    ///
    /// Returns `None` if no such payment exists (yet).
    async fn fill_charge_reference(
        &self,
        payment_reference: &str,
        charge_reference: &str,
    ) -> Result<Option<Payment>, LedgerError>;
}
