//! # Marketplace payment engine public API
//!
//! The `market_api` module exposes the programmatic API of the payment engine. The API is modular, so that clients can
//! pick and choose the functionality they want.
//!
//! * [`checkout_api`] starts checkouts for direct purchases and accepted offers.
//! * [`order_flow_api`] is the order ledger. Both reconciliation paths funnel into it.
//! * [`webhook_api`] is the push side of reconciliation.
//! * [`poller`] is the pull side of reconciliation.
//! * [`offer_api`] manages price negotiations.
//!
//! # API usage
//!
//! Every API is created from a backend that implements the traits it needs. For example:
//!
//! ```rust,ignore
//! use market_payment_engine::{events::EventProducers, OfferApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OfferManagement and ProductCatalog
//! let api = OfferApi::new(db);
//! let offers = api.offers_for_conversation(conversation_id, user_id).await?;
//! ```
pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod offer_api;
pub mod order_flow_api;
pub mod poll_objects;
pub mod poller;
pub mod webhook_api;
pub mod webhook_objects;
