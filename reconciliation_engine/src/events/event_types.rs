use crate::db_types::{Order, OrderItem, Tenant};

/// Published exactly once per order, by whichever reconciliation performed the pending → paid transition.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tenant: Tenant,
}

impl OrderPaidEvent {
    pub fn new(order: Order, items: Vec<OrderItem>, tenant: Tenant) -> Self {
        Self { order, items, tenant }
    }
}
