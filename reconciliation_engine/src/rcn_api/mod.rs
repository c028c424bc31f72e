pub mod payment_objects;
pub mod reconciliation_api;
