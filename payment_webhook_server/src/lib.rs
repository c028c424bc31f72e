//! # Payment webhook server
//! This crate hosts the server side of payment reconciliation. It is responsible for:
//! * Receiving payment notifications from the payment gateway and acknowledging them immediately.
//! * Verifying the notification signature (see [`signature`]).
//! * Fetching the authoritative payment from the gateway, or simulating it (see [`integrations::gateway`]).
//! * Reconciling the order against the payment, retrying transient failures with exponential backoff (see [`retry`]).
//! * Sending payment confirmations once an order is paid (see [`notifications`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/webhook`: Payment gateway notifications. Always answers 200 OK with an empty body.

pub mod cli;
pub mod config;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod notifications;
pub mod pipeline;
pub mod retry;
pub mod routes;
pub mod server;
pub mod signature;
pub mod webhook;

#[cfg(test)]
mod endpoint_tests;
