use cucumber::{given, then, when};
use reconciliation_engine::{
    db_types::{NewTenant, OrderId, OrderStatusType, PaymentStatusType},
    test_utils::fixtures,
    PaymentRecord,
    ReconcileOutcome,
    ReconciliationError,
};

use crate::cucumber::{ReconciliationSystem, ReconciliationWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut ReconciliationWorld) {
    let system = ReconciliationSystem::new().await;
    world.system = Some(system);
}

#[given("the Barber Shop tenant")]
async fn barber_shop(world: &mut ReconciliationWorld) {
    world.system().db.insert_tenant(fixtures::barber_shop()).await.expect("Error inserting tenant");
}

#[given(expr = "the tenant {string}")]
async fn another_tenant(world: &mut ReconciliationWorld, tenant_id: String) {
    let tenant = NewTenant::new(&tenant_id, "Another Shop", "USD");
    world.system().db.insert_tenant(tenant).await.expect("Error inserting tenant");
}

#[given(expr = "a pending order {string} for the Barber Shop")]
async fn pending_order(world: &mut ReconciliationWorld, order_id: String) {
    world.system().db.insert_order(fixtures::order(&order_id)).await.expect("Error inserting order");
}

#[given(expr = "order {string} was refunded")]
async fn refunded_order(world: &mut ReconciliationWorld, order_id: String) {
    let db = &world.system().db;
    fixtures::set_order_state(db, &order_id, PaymentStatusType::Refunded, OrderStatusType::Completed).await;
}

#[given(expr = "order {string} was cancelled")]
async fn cancelled_order(world: &mut ReconciliationWorld, order_id: String) {
    let db = &world.system().db;
    fixtures::set_order_state(db, &order_id, PaymentStatusType::Pending, OrderStatusType::Cancelled).await;
}

async fn reconcile(world: &mut ReconciliationWorld, record: PaymentRecord, tenant_id: &str) {
    let result = world.system().api.reconcile(&record, tenant_id).await;
    world.last_result = Some(result);
}

#[when(expr = "payment {int} for order {string} is reported as {string}")]
async fn payment_reported(world: &mut ReconciliationWorld, id: u64, order_id: String, status: String) {
    let record = PaymentRecord::new(id, status.as_str(), &order_id);
    reconcile(world, record, fixtures::TENANT_ID).await;
}

#[when(expr = "payment {int} for order {string} is reported as {string} for tenant {string}")]
async fn payment_reported_for_tenant(
    world: &mut ReconciliationWorld,
    id: u64,
    order_id: String,
    status: String,
    tenant_id: String,
) {
    let record = PaymentRecord::new(id, status.as_str(), &order_id);
    reconcile(world, record, &tenant_id).await;
}

#[when(expr = "payment {int} for order {string} is reported as {string} with payment method {string}")]
async fn payment_reported_with_method(
    world: &mut ReconciliationWorld,
    id: u64,
    order_id: String,
    status: String,
    method: String,
) {
    let record = PaymentRecord::new(id, status.as_str(), &order_id).with_payment_method(&method);
    reconcile(world, record, fixtures::TENANT_ID).await;
}

#[then(expr = "the outcome is {string}")]
async fn outcome_is(world: &mut ReconciliationWorld, expected: String) {
    let outcome = match world.last_result.as_ref().expect("Nothing has been reconciled") {
        Ok(outcome) => outcome,
        Err(e) => panic!("Reconciliation failed: {e}"),
    };
    let actual = match outcome {
        ReconcileOutcome::Paid(_) => "Paid",
        ReconcileOutcome::AlreadyPaid(_) => "AlreadyPaid",
        ReconcileOutcome::Recorded(_, _) => "Recorded",
        ReconcileOutcome::NotPayable(_) => "NotPayable",
    };
    assert_eq!(actual, expected, "Unexpected outcome: {outcome}");
}

#[then(expr = "the reconciliation fails with {string}")]
async fn fails_with(world: &mut ReconciliationWorld, expected: String) {
    let err = match world.last_result.as_ref().expect("Nothing has been reconciled") {
        Ok(outcome) => panic!("Expected an error, but got: {outcome}"),
        Err(e) => e,
    };
    let actual = match err {
        ReconciliationError::DatabaseError(_) => "DatabaseError",
        ReconciliationError::OrderNotFound(_) => "OrderNotFound",
        ReconciliationError::TenantNotFound(_) => "TenantNotFound",
        ReconciliationError::TenantMismatch { .. } => "TenantMismatch",
    };
    assert_eq!(actual, expected, "Unexpected error: {err}");
}

#[then(expr = "order {string} has payment status {string} and status {string}")]
async fn order_statuses(world: &mut ReconciliationWorld, order_id: String, payment_status: String, status: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.payment_status, payment_status.parse::<PaymentStatusType>().unwrap());
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then(expr = "order {string} has gateway payment id {string} with status {string}")]
async fn order_gateway_fields(world: &mut ReconciliationWorld, order_id: String, payment_id: String, status: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.gateway_payment_id.as_deref(), Some(payment_id.as_str()));
    assert_eq!(order.gateway_payment_status.as_deref(), Some(status.as_str()));
    let snapshot = order.snapshot().expect("No gateway snapshot recorded");
    assert_eq!(snapshot.payment_id, payment_id);
    assert_eq!(snapshot.status, status);
}

#[then(expr = "order {string} has payment method {string}")]
async fn order_payment_method(world: &mut ReconciliationWorld, order_id: String, method: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.payment_method.as_deref(), Some(method.as_str()));
}

#[then(expr = "the order paid hook fires {int} time(s)")]
async fn hook_fired(world: &mut ReconciliationWorld, expected: usize) {
    let count = world.system().paid_event_count(expected).await;
    assert_eq!(count, expected);
}

#[then(expr = "the paid event for order {string} lists {int} items for tenant {string}")]
async fn paid_event_contents(world: &mut ReconciliationWorld, order_id: String, items: usize, tenant_id: String) {
    let _ = world.system().paid_event_count(1).await;
    let events = world.system().paid_events.lock().unwrap().clone();
    let event = events.iter().find(|e| e.order.id.as_str() == order_id).expect("No paid event for order");
    assert_eq!(event.items.len(), items);
    assert_eq!(event.tenant.id, tenant_id);
    assert_eq!(event.order.customer_email.as_deref(), Some(fixtures::CUSTOMER_EMAIL));
}

#[then(expr = "order {string} reads as {string} straight after reconciling")]
async fn committed_on_return(world: &mut ReconciliationWorld, order_id: String, payment_status: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.payment_status, payment_status.parse::<PaymentStatusType>().unwrap());
}
