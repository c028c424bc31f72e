use std::future::Future;

use thiserror::Error;

use crate::db_types::{GatewaySnapshot, Order, OrderId, OrderItem};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No order matches the external reference {0}")]
    OrderNotFound(String),
    #[error("Tenant {0} does not exist")]
    TenantNotFound(String),
    #[error("Order {order_id} belongs to tenant {actual}, but the notification was for tenant {expected}")]
    TenantMismatch { order_id: OrderId, expected: String, actual: String },
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

/// The order-side behaviour a backend must support.
///
/// The engine never creates or deletes orders. It reads them, records what the gateway said about them, and performs
/// the single pending → paid transition.
pub trait ReconciliationDatabase: Clone + Send + Sync + 'static {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Resolves the gateway's external reference (our order id) to the order.
    fn fetch_order_by_external_reference(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<Order>, ReconciliationError>> + Send;

    /// The line items of the order, with product names resolved.
    fn fetch_order_items(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, ReconciliationError>> + Send;

    /// Stores the gateway payment id, raw status and the full snapshot against the order. If the order has no payment
    /// method yet, the snapshot's `payment_method_id` is used.
    ///
    /// This never touches `status` or `payment_status`. Returns the updated order.
    fn record_gateway_snapshot(
        &self,
        order_id: &OrderId,
        snapshot: &GatewaySnapshot,
    ) -> impl Future<Output = Result<Order, ReconciliationError>> + Send;

    /// Marks the order as paid and completed, but only if its payment is still pending and it hasn't been cancelled.
    ///
    /// This must be a single conditional write, durably committed before the call returns. Returns `Some(order)` when
    /// this call performed the transition and `None` otherwise, so that exactly one of any number of concurrent
    /// callers sees `Some`.
    fn mark_order_paid(&self, order_id: &OrderId)
        -> impl Future<Output = Result<Option<Order>, ReconciliationError>> + Send;
}
