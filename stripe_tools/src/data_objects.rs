use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stripe returns related objects either as a bare id or, when requested with `expand[]`, as the full object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T> Expandable<T> {
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(o) => Some(o),
        }
    }
}

impl Expandable<PaymentIntent> {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(pi) => &pi.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Complete,
    Expired,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "open"),
            SessionStatus::Complete => write!(f, "complete"),
            SessionStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl Display for SessionPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPaymentStatus::Paid => write!(f, "paid"),
            SessionPaymentStatus::Unpaid => write!(f, "unpaid"),
            SessionPaymentStatus::NoPaymentRequired => write!(f, "no_payment_required"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    pub payment_status: SessionPaymentStatus,
    #[serde(default)]
    pub payment_intent: Option<Expandable<PaymentIntent>>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CheckoutSession {
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.payment_intent.as_ref().map(|pi| pi.id())
    }

    /// The charge id, if the payment intent was expanded and has been charged.
    pub fn charge_id(&self) -> Option<&str> {
        self.payment_intent.as_ref().and_then(|pi| pi.as_object()).and_then(|pi| pi.charge_id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub charges: Option<ChargeList>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntent {
    /// Older API versions embed the charge list; newer ones only carry `latest_charge`.
    pub fn charge_id(&self) -> Option<&str> {
        self.charges
            .as_ref()
            .and_then(|c| c.data.first())
            .map(|c| c.id.as_str())
            .or(self.latest_charge.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeList {
    #[serde(default)]
    pub data: Vec<Charge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
}

/// Stripe webhook event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub livemode: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// A single-item, card-only checkout session request.
#[derive(Debug, Clone, Default)]
pub struct NewCheckoutSession {
    pub product_name: String,
    pub product_description: Option<String>,
    /// Amount in currency minor units
    pub unit_amount: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    /// Copied onto both the session and its payment intent
    pub metadata: BTreeMap<String, String>,
}

const MAX_DESCRIPTION_LEN: usize = 500;

impl NewCheckoutSession {
    /// Flattens the request into Stripe's bracketed form encoding.
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), self.currency.clone()),
            ("line_items[0][price_data][unit_amount]".to_string(), self.unit_amount.to_string()),
            ("line_items[0][price_data][product_data][name]".to_string(), self.product_name.clone()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        if let Some(desc) = self.product_description.as_ref().filter(|d| !d.trim().is_empty()) {
            let desc = desc.chars().take(MAX_DESCRIPTION_LEN).collect::<String>();
            params.push(("line_items[0][price_data][product_data][description]".to_string(), desc));
        }
        if let Some(email) = self.customer_email.as_ref().filter(|e| !e.is_empty()) {
            params.push(("customer_email".to_string(), email.clone()));
        }
        for (k, v) in &self.metadata {
            params.push((format!("metadata[{k}]"), v.clone()));
            params.push((format!("payment_intent_data[metadata][{k}]"), v.clone()));
        }
        params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn form_params() {
        let mut metadata = BTreeMap::new();
        metadata.insert("order_id".to_string(), "42".to_string());
        let req = NewCheckoutSession {
            product_name: "Bike".into(),
            product_description: Some("x".repeat(600)),
            unit_amount: 8000,
            currency: "eur".into(),
            customer_email: None,
            success_url: "https://shop/ok".into(),
            cancel_url: "https://shop/cancel".into(),
            metadata,
        };
        let params = req.to_form_params();
        let get = |k: &str| params.iter().find(|(key, _)| key == k).map(|(_, v)| v.clone());
        assert_eq!(get("line_items[0][price_data][unit_amount]").unwrap(), "8000");
        assert_eq!(get("metadata[order_id]").unwrap(), "42");
        assert_eq!(get("payment_intent_data[metadata][order_id]").unwrap(), "42");
        assert_eq!(get("line_items[0][price_data][product_data][description]").unwrap().len(), 500);
        assert!(get("customer_email").is_none());
    }

    #[test]
    fn deserialize_expanded_session() {
        let json = r#"{
            "id": "cs_test_1",
            "object": "checkout.session",
            "status": "complete",
            "payment_status": "paid",
            "url": null,
            "payment_intent": {
                "id": "pi_1",
                "status": "succeeded",
                "latest_charge": "ch_9",
                "metadata": {"order_id": "3"}
            },
            "metadata": {"order_id": "3"}
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.status, Some(SessionStatus::Complete));
        assert_eq!(session.payment_status, SessionPaymentStatus::Paid);
        assert_eq!(session.payment_intent_id(), Some("pi_1"));
        assert_eq!(session.charge_id(), Some("ch_9"));
    }

    #[test]
    fn deserialize_unexpanded_session() {
        let json = r#"{"id": "cs_2", "status": "expired", "payment_status": "unpaid", "payment_intent": "pi_2"}"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.status, Some(SessionStatus::Expired));
        assert_eq!(session.payment_intent_id(), Some("pi_2"));
        assert!(session.charge_id().is_none());
    }

    #[test]
    fn legacy_charge_list() {
        let json = r#"{"id": "pi_3", "charges": {"object": "list", "data": [{"id": "ch_1"}]}}"#;
        let pi: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(pi.charge_id(), Some("ch_1"));
    }
}
