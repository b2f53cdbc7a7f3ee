//! Marketplace Payment Engine
//!
//! The payment engine is the reconciliation core of the second-hand marketplace. It turns "a buyer wants this item"
//! into a priced order, hands the buyer to an external checkout provider, and later learns (by webhook or by polling)
//! that the payment went through. This library contains that logic. It is provider-agnostic: the provider is reached
//! through the [`traits::PaymentProvider`] trait, and provider notifications arrive already translated into
//! [`PaymentEvent`]s.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]) and their SQLite implementation ([`SqliteDatabase`]). You should never
//!    need to access the database directly. Instead, use the public API provided by the payment engine. The exception
//!    is the data types stored in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The payment engine public API ([`mod@market_api`]): checkout, the order ledger, webhook handling, the poller and
//!    offer negotiation.
//! 3. Fee calculation ([`mod@fees`]).
//!
//! The engine also provides a set of events that can be subscribed to. These are emitted when an order is paid, or
//! when a pending order is closed without payment. A simple Actor framework is used so that you can easily hook into
//! these events and perform custom actions.
pub mod db_types;
pub mod events;
pub mod fees;
pub mod market_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use market_api::{
    checkout_api::CheckoutApi,
    checkout_objects::{CheckoutParams, CheckoutSession, PayableTarget},
    errors::{CheckoutError, OfferApiError, OrderFlowError, ValidationError, WebhookError},
    offer_api::OfferApi,
    order_flow_api::OrderFlowApi,
    poll_objects::{PollAction, PollOptions, PollOutcome, PollSummary},
    poller::PaymentPoller,
    webhook_api::WebhookApi,
    webhook_objects::{PaymentEvent, PaymentEventKind, WebhookOutcome},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
