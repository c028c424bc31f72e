//! Reconciliation Engine
//!
//! The reconciliation engine applies authoritative payment-gateway state to local orders. It is provider-agnostic:
//! the gateway response arrives already normalized as a [`PaymentRecord`], and the engine only cares about which order
//! it refers to and whether the payment was approved.
//!
//! The library is divided into three main sections:
//! 1. Backend traits ([`mod@traits`]) and the SQLite implementation of them ([`SqliteDatabase`]). You should never need
//!    to touch the database directly. The data types stored in it live in [`mod@db_types`] and are public.
//! 2. The public API ([`ReconciliationApi`]). This is where the idempotency rules live: an order moves from pending to
//!    paid at most once, no matter how many times the gateway tells us about it.
//! 3. Events ([`mod@events`]). When an order is paid for the first time, an [`events::OrderPaidEvent`] is published.
//!    Notification delivery hooks into this.
pub mod db_types;
pub mod events;
pub mod traits;

mod rcn_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
#[doc(hidden)]
pub mod test_utils;

pub use rcn_api::{
    payment_objects::{GatewayPaymentStatus, PaymentRecord, ReconcileOutcome},
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
pub use traits::{ReconciliationDatabase, ReconciliationError, TenantManagement};
