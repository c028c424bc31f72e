//! Payment confirmation messages.
//!
//! The [`NotificationDispatcher`] is registered as the `on_order_paid` hook, so it runs exactly once per order, after
//! the paid transition has been committed. Delivery is best-effort: a failure is logged and forgotten, and a failure
//! for one recipient never stops the message to the other.
use std::{fmt::Display, future::Future, sync::Arc};

use log::*;
use reconciliation_engine::{
    db_types::{GatewaySnapshot, Order, OrderItem, Tenant},
    events::{EventHooks, OrderPaidEvent},
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    PaymentConfirmedCustomer,
    PaymentConfirmedTenant,
}

impl Display for MailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailTemplate::PaymentConfirmedCustomer => write!(f, "payment_confirmed_customer"),
            MailTemplate::PaymentConfirmedTenant => write!(f, "payment_confirmed_tenant"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Could not deliver message. {0}")]
    DeliveryFailed(String),
}

/// The mail subsystem. Rendering and transport are its business; we only hand over the template and its context.
pub trait Mailer: Send + Sync + 'static {
    fn send(
        &self,
        to: &str,
        template: MailTemplate,
        context: Value,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: MailTemplate, context: Value) -> Result<(), MailError> {
        info!("📧️ [{template}] to {to}: {context}");
        Ok(())
    }
}

pub struct NotificationDispatcher<M> {
    mailer: Arc<M>,
}

impl<M> Clone for NotificationDispatcher<M> {
    fn clone(&self) -> Self {
        Self { mailer: Arc::clone(&self.mailer) }
    }
}

impl<M: Mailer> NotificationDispatcher<M> {
    pub fn new(mailer: M) -> Self {
        Self { mailer: Arc::new(mailer) }
    }

    /// Sends the confirmation to the customer (if the order has an email address) and to the tenant (if it has a
    /// contact address). Never fails.
    pub async fn notify_payment_confirmed(&self, order: &Order, items: &[OrderItem], tenant: &Tenant) {
        let context = confirmation_context(order, items, tenant);
        let customer = self.deliver(order.customer_email.as_deref(), MailTemplate::PaymentConfirmedCustomer, &context);
        let owner = self.deliver(tenant.contact_email.as_deref(), MailTemplate::PaymentConfirmedTenant, &context);
        futures::join!(customer, owner);
    }

    async fn deliver(&self, to: Option<&str>, template: MailTemplate, context: &Value) {
        let Some(to) = to.map(str::trim).filter(|s| !s.is_empty()) else {
            debug!("📧️ No recipient for {template}. Skipping.");
            return;
        };
        match self.mailer.send(to, template, context.clone()).await {
            Ok(()) => debug!("📧️ Sent {template} to {to}"),
            Err(e) => warn!("📧️ Could not send {template} to {to}. {e}"),
        }
    }

    /// Registers this dispatcher as the `on_order_paid` hook.
    pub fn register(&self, hooks: &mut EventHooks) {
        let dispatcher = self.clone();
        hooks.on_order_paid(move |ev: OrderPaidEvent| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move {
                info!("📧️ Order {} was paid. Sending confirmations.", ev.order.id);
                dispatcher.notify_payment_confirmed(&ev.order, &ev.items, &ev.tenant).await;
            })
        });
    }
}

pub fn confirmation_context(order: &Order, items: &[OrderItem], tenant: &Tenant) -> Value {
    let currency = tenant.currency.as_str();
    let items = items
        .iter()
        .map(|item| {
            json!({
                "name": item.product_name,
                "quantity": item.quantity,
                "unit_price": item.price.format_in(currency),
            })
        })
        .collect::<Vec<Value>>();
    json!({
        "order_id": order.id.as_str(),
        "total": order.total.format_in(currency),
        "currency": currency,
        "amount_paid": order.snapshot().and_then(GatewaySnapshot::amount).map(|m| m.format_in(currency)),
        "items": items,
        "tenant_name": tenant.name,
    })
}
