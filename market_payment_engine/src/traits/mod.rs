//! # Backend and provider contracts
//!
//! This module defines the behaviour that database backends and payment providers need to expose in order to be
//! driven by the marketplace payment engine.
//!
//! * [`PaymentLedgerDatabase`] is the heart of the ledger: order creation, the exactly-once `PENDING -> PAID`
//!   transition, payment records and poll bookkeeping.
//! * [`ProductCatalog`] is the ledger's narrow view of listed products.
//! * [`OfferManagement`] stores price negotiations between buyers and sellers.
//! * [`WebhookEventLog`] is the append-only log of provider webhook deliveries, used to make processing idempotent.
//! * [`PaymentProvider`] is the external checkout provider (Stripe in production).
//!
//! Every state transition a backend offers is a compare-and-set: the expected current status is part of the write, so
//! concurrent callers cannot both succeed.
mod data_objects;
mod offer_management;
mod payment_ledger_database;
mod payment_provider;
mod product_catalog;
mod webhook_event_log;

pub use data_objects::{Completion, CompletionOutcome};
pub use offer_management::OfferManagement;
pub use payment_ledger_database::{LedgerError, PaymentLedgerDatabase};
pub use payment_provider::{
    CheckoutRequest,
    PaymentProvider,
    ProviderError,
    ProviderSession,
    SessionSnapshot,
    SessionState,
};
pub use product_catalog::ProductCatalog;
pub use webhook_event_log::WebhookEventLog;
