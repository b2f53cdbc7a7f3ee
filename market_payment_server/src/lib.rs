//! # Marketplace payment server
//! This crate hosts the HTTP server for the marketplace payment engine. It is responsible for:
//! * Starting checkouts for direct purchases and accepted offers.
//! * Receiving and verifying Stripe webhooks, and handing them to the engine.
//! * Optionally polling Stripe for pending orders in the background.
//! * Price negotiation and order queries for buyers and sellers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/stripe`: Signed Stripe webhook deliveries.
//! * `/api/...`: Checkout, offer and order routes for logged-in users.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod poll_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
