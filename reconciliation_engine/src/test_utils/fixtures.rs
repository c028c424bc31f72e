//! Canned tenants and orders used across the test suites.
use crate::{
    db_types::{Money, NewOrder, NewTenant, OrderId, OrderStatusType, PaymentStatusType},
    SqliteDatabase,
};

pub const TENANT_ID: &str = "barber-shop";
pub const TENANT_EMAIL: &str = "owner@barbershop.test";
pub const CUSTOMER_EMAIL: &str = "customer@example.com";

pub fn barber_shop() -> NewTenant {
    NewTenant::new(TENANT_ID, "Barber Shop", "ARS").with_contact_email(TENANT_EMAIL).with_access_token("TEST-token-123")
}

/// A pending order for 100.00, made up of one haircut and two bottles of shampoo.
pub fn order(id: &str) -> NewOrder {
    NewOrder::new(OrderId::from(id), TENANT_ID, Money::from_major(100))
        .with_customer_email(CUSTOMER_EMAIL)
        .with_item("haircut", "Haircut", 1, Money::from_major(60))
        .with_item("shampoo", "Shampoo", 2, Money::from_major(20))
}

/// Inserts the barber shop tenant and the given pending orders.
pub async fn seed(db: &SqliteDatabase, order_ids: &[&str]) {
    db.insert_tenant(barber_shop()).await.expect("Error inserting tenant");
    for id in order_ids {
        db.insert_order(order(id)).await.expect("Error inserting order");
    }
}

/// Forces an order into the given state, standing in for the parts of the system that refund and cancel orders.
pub async fn set_order_state(db: &SqliteDatabase, id: &str, payment_status: PaymentStatusType, status: OrderStatusType) {
    sqlx::query("UPDATE orders SET payment_status = $1, status = $2 WHERE id = $3")
        .bind(payment_status)
        .bind(status)
        .bind(id)
        .execute(db.pool())
        .await
        .expect("Error updating order state");
}
