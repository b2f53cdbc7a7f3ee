use thiserror::Error;

use crate::{
    db_types::{OfferStatus, OrderStatusType},
    traits::{LedgerError, ProviderError},
};

/// A request was rejected before anything was written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("success_url and cancel_url are required")]
    MissingRedirectUrls,
    #[error("Product {0} is not available for purchase")]
    ProductNotAvailable(i64),
    #[error("You cannot buy your own product")]
    OwnProduct,
    #[error("Offer {0} must be accepted before payment")]
    OfferNotAccepted(i64),
    #[error("Only the buyer can pay for offer {0}")]
    NotOfferBuyer(i64),
    #[error("Offer amount must be greater than zero")]
    NonPositiveAmount,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Offer {0} does not exist")]
    OfferNotFound(i64),
    #[error("Payment provider error. {0}")]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    Database(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Insufficient permissions. {0}")]
    Forbidden(String),
    #[error("Order {order_id} cannot be changed because it is {status}")]
    NotPending { order_id: i64, status: OrderStatusType },
    #[error("{0}")]
    Database(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum OfferApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Offer {0} does not exist")]
    OfferNotFound(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient permissions. {0}")]
    Forbidden(String),
    #[error("Offer {offer_id} cannot move from {from} to {to}")]
    InvalidTransition { offer_id: i64, from: OfferStatus, to: OfferStatus },
    #[error("You already have a pending offer for product {0}")]
    PendingOfferExists(i64),
    #[error("{0}")]
    Database(LedgerError),
}

impl From<LedgerError> for OfferApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::PendingOfferExists { product_id, .. } => OfferApiError::PendingOfferExists(product_id),
            LedgerError::OfferNotFound(id) => OfferApiError::OfferNotFound(id),
            LedgerError::ProductNotFound(id) => OfferApiError::ProductNotFound(id),
            e => OfferApiError::Database(e),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("The webhook event could not be understood. {0}")]
    MalformedEvent(String),
    #[error("{0}")]
    Database(#[from] LedgerError),
}
