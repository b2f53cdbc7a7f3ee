use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

/// Implements `Display`, `FromStr` and the infallible `From<String>` used when reading rows, for status enums that are
/// persisted as their variant names.
macro_rules! status_conversions {
    ($ty:ident, $default:ident, [$($variant:ident),+ $(,)?]) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($ty::$variant => write!(f, stringify!($variant)),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{}: {s}", stringify!($ty)))),
                }
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!(
                        "Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($ty),
                        stringify!($default)
                    );
                    $ty::$default
                })
            }
        }
    };
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the buyer to complete checkout.
    Pending,
    /// Payment has been confirmed by the provider. Terminal.
    Paid,
    /// Checkout could not be started, or the checkout session expired.
    Failed,
    /// The payment was refunded. Reserved; nothing in the engine produces it.
    Refunded,
    /// The buyer abandoned the order before paying.
    Cancelled,
}

status_conversions!(OrderStatusType, Pending, [Pending, Paid, Failed, Refunded, Cancelled]);

//--------------------------------------   ProductStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Available,
    Sold,
}

status_conversions!(ProductStatus, Available, [Available, Sold]);

//--------------------------------------    OfferStatus        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Paid,
    Cancelled,
}

status_conversions!(OfferStatus, Pending, [Pending, Accepted, Declined, Paid, Cancelled]);

//--------------------------------------       Product         ---------------------------------------------------------
/// The ledger's view of a listed item. Listing management lives elsewhere; the ledger only needs the seller, the list
/// price and whether the item is still for sale.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub status: ProductStatus,
    pub buyer_id: Option<i64>,
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: i64, title: S, price: Money) -> Self {
        Self { seller_id, title: title.into(), description: None, price }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    /// Set when the order pays for a negotiated offer.
    pub offer_id: Option<i64>,
    pub price: Money,
    pub platform_fee: Money,
    pub seller_amount: Money,
    pub currency: String,
    pub status: OrderStatusType,
    pub external_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub poll_count: i64,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatusType::Pending
    }

    pub fn involves(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub offer_id: Option<i64>,
    pub price: Money,
    pub platform_fee: Money,
    pub seller_amount: Money,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Payment         ---------------------------------------------------------
/// The audit record of a successful payment. There is at most one per order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub external_payment_reference: Option<String>,
    pub external_charge_reference: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub successful: bool,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub raw_payload: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub external_payment_reference: Option<String>,
    pub external_charge_reference: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub raw_payload: Option<String>,
}

//--------------------------------------        Offer          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub conversation_id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: Money,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Offer {
    pub fn involves(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOffer {
    pub conversation_id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub amount: Money,
}

//--------------------------------------    WebhookEvent       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub payload: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookEvent {
    pub event_id: String,
    pub event_type: String,
    pub payload: String,
}
