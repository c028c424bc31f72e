mod reconciliation_world;
mod steps;

pub use reconciliation_world::{ReconciliationSystem, ReconciliationWorld};
