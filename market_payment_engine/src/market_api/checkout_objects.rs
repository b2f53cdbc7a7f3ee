use serde::{Deserialize, Serialize};

/// What the buyer is paying for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayableTarget {
    /// Buy the product at its list price
    Direct { product_id: i64 },
    /// Pay the amount agreed in an accepted offer
    Negotiated { offer_id: i64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub buyer_id: i64,
    pub buyer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutParams {
    pub fn new<S: Into<String>>(buyer_id: i64, success_url: S, cancel_url: S) -> Self {
        Self { buyer_id, buyer_email: None, success_url: success_url.into(), cancel_url: cancel_url.into() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.buyer_email = Some(email.into());
        self
    }
}

/// Returned to the client, which redirects the buyer to `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
    pub order_id: i64,
}
