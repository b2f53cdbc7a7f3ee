use std::fmt::Display;

use market_payment_engine::{db_types::OfferStatus, CheckoutParams};
use mkt_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Where the provider sends the buyer after checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRedirects {
    #[serde(default)]
    pub success_url: String,
    #[serde(default)]
    pub cancel_url: String,
    /// Pre-fills the provider's checkout form
    #[serde(default)]
    pub email: Option<String>,
}

impl CheckoutRedirects {
    pub fn into_params(self, buyer_id: i64) -> CheckoutParams {
        let params = CheckoutParams::new(buyer_id, self.success_url, self.cancel_url);
        match self.email {
            Some(email) => params.with_email(email),
            None => params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRequest {
    pub conversation_id: i64,
    pub product_id: i64,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OfferStatusUpdate {
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConversationQuery {
    pub conversation_id: i64,
}
