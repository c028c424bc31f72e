use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, OrderItem, Tenant},
    events::{EventProducers, OrderPaidEvent},
    traits::{ReconciliationDatabase, ReconciliationError, TenantManagement},
    PaymentRecord,
    ReconcileOutcome,
};

/// `ReconciliationApi` applies gateway payment state to local orders.
///
/// Delivery from the gateway is at-least-once, and the same payment can be reconciled concurrently by different
/// tasks. The API guarantees at-most-once business effect regardless: an order is marked as paid, and the
/// [`OrderPaidEvent`] published, by exactly one reconciliation.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B: Clone> Clone for ReconciliationApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconciliationApi<B>
where B: ReconciliationDatabase + TenantManagement
{
    pub async fn fetch_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, ReconciliationError> {
        self.db.fetch_tenant(tenant_id).await
    }

    /// Fetches the order that the gateway's external reference points to.
    pub async fn fetch_order(&self, reference: &str) -> Result<Option<Order>, ReconciliationError> {
        self.db.fetch_order_by_external_reference(reference).await
    }

    /// Applies the payment record to the order it references.
    ///
    /// * The gateway snapshot is always recorded, whatever the status.
    /// * If the payment is approved and the order is still pending, the order is marked as paid and completed and an
    ///   [`OrderPaidEvent`] is published once that change is committed.
    /// * If the order is already paid, refunded or cancelled, nothing else happens.
    ///
    /// Errors:
    /// * [`ReconciliationError::OrderNotFound`] if the reference doesn't match any order. The order may not have been
    ///   committed yet, so callers should treat this as transient.
    /// * [`ReconciliationError::TenantMismatch`] if the order belongs to another tenant.
    pub async fn reconcile(
        &self,
        record: &PaymentRecord,
        tenant_id: &str,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        let reference = record.external_reference.as_str();
        let order = self
            .db
            .fetch_order_by_external_reference(reference)
            .await?
            .ok_or_else(|| ReconciliationError::OrderNotFound(reference.to_string()))?;
        if order.tenant_id != tenant_id {
            warn!(
                "🔄️ Payment {} references order {} of tenant {}, but was received for tenant {tenant_id}",
                record.id, order.id, order.tenant_id
            );
            return Err(ReconciliationError::TenantMismatch {
                order_id: order.id,
                expected: tenant_id.to_string(),
                actual: order.tenant_id,
            });
        }
        let order = self.db.record_gateway_snapshot(&order.id, &record.snapshot()).await?;
        trace!("🔄️ Payment {} ({}) recorded against order {}", record.id, record.status, order.id);
        if !record.status.is_approved() {
            debug!("🔄️ Payment {} for order {} is {}. No transition.", record.id, order.id, record.status);
            return Ok(ReconcileOutcome::Recorded(order, record.status.clone()));
        }
        if order.is_paid() {
            info!("🔄️ Order {} is already paid. Ignoring repeat approval for payment {}", order.id, record.id);
            return Ok(ReconcileOutcome::AlreadyPaid(order));
        }
        if !order.is_payable() {
            warn!(
                "🔄️ Payment {} is approved, but order {} is {} with payment {}. Leaving it alone.",
                record.id, order.id, order.status, order.payment_status
            );
            return Ok(ReconcileOutcome::NotPayable(order));
        }
        // Everything the paid event needs is gathered before the transition, so that a failure here leaves the order
        // pending and the attempt can be retried.
        let event_context = self.order_paid_context(&order.id, tenant_id).await?;
        match self.db.mark_order_paid(&order.id).await? {
            Some(paid) => {
                info!("🔄️💰️ Order {} is paid (gateway payment {})", paid.id, record.id);
                let (items, tenant) = event_context;
                self.call_order_paid_hook(OrderPaidEvent::new(paid.clone(), items, tenant)).await;
                Ok(ReconcileOutcome::Paid(paid))
            },
            None => {
                let order = self
                    .db
                    .fetch_order_by_external_reference(reference)
                    .await?
                    .ok_or_else(|| ReconciliationError::OrderNotFound(reference.to_string()))?;
                if order.is_paid() {
                    info!("🔄️ Order {} was paid by a concurrent reconciliation of payment {}", order.id, record.id);
                    Ok(ReconcileOutcome::AlreadyPaid(order))
                } else {
                    warn!("🔄️ Order {} changed to {} while payment {} was applied", order.id, order.status, record.id);
                    Ok(ReconcileOutcome::NotPayable(order))
                }
            },
        }
    }

    async fn order_paid_context(
        &self,
        order_id: &OrderId,
        tenant_id: &str,
    ) -> Result<(Vec<OrderItem>, Tenant), ReconciliationError> {
        let items = self.db.fetch_order_items(order_id).await?;
        let tenant = self
            .db
            .fetch_tenant(tenant_id)
            .await?
            .ok_or_else(|| ReconciliationError::TenantNotFound(tenant_id.to_string()))?;
        Ok((items, tenant))
    }

    async fn call_order_paid_hook(&self, event: OrderPaidEvent) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
