//! # Backend contracts
//!
//! These traits define what a storage backend has to provide for the reconciliation engine to work.
//!
//! * [`ReconciliationDatabase`] covers the order side: looking an order up by the gateway's external reference,
//!   recording the latest gateway snapshot against it, and the conditional pending → paid transition.
//! * [`TenantManagement`] is the read-only view of tenants, which carry the gateway credentials and currency.
//!
//! Methods return `Send` futures so that the engine can be driven from spawned tasks.
mod reconciliation_database;
mod tenant_management;

pub use reconciliation_database::{ReconciliationDatabase, ReconciliationError};
pub use tenant_management::TenantManagement;
