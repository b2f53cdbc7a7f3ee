use std::collections::BTreeMap;

use mkt_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not reach the payment provider: {0}")]
    Unavailable(String),
    #[error("The payment provider rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment provider sent a response we could not understand: {0}")]
    InvalidResponse(String),
}

/// Everything the provider needs to open a checkout session for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub offer_id: Option<i64>,
    pub product_name: String,
    pub description: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Correlation data attached to the session, so that provider-side records can be traced back to the order.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        result.insert("order_id".to_string(), self.order_id.to_string());
        result.insert("product_id".to_string(), self.product_id.to_string());
        result.insert("buyer_id".to_string(), self.buyer_id.to_string());
        result.insert("seller_id".to_string(), self.seller_id.to_string());
        if let Some(offer_id) = self.offer_id {
            result.insert("offer_id".to_string(), offer_id.to_string());
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub session_id: String,
    /// Where to send the buyer to pay
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Complete,
    Expired,
}

/// The provider's current view of a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub paid: bool,
    pub payment_reference: Option<String>,
    pub charge_reference: Option<String>,
    pub raw: serde_json::Value,
}

/// An external checkout provider.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<ProviderSession, ProviderError>;

    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError>;
}
