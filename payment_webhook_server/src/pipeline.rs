//! One reconciliation attempt: fetch the tenant, fetch the authoritative payment from the gateway, and reconcile the
//! order against it.
//!
//! Every failure is classified into a [`PipelineError`], and [`PipelineError::is_retryable`] is the single place that
//! decides whether the retry coordinator tries again.
use std::future::Future;

use log::*;
use reconciliation_engine::{
    ReconcileOutcome,
    ReconciliationApi,
    ReconciliationDatabase,
    ReconciliationError,
    TenantManagement,
};
use thiserror::Error;

use crate::integrations::gateway::GatewayClient;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Authentication failed. {0}")]
    Authentication(String),
    #[error("Configuration error. {0}")]
    Configuration(String),
    #[error("Gateway error. {0}")]
    Gateway(String),
    #[error("The payment does not reference an order. {0}")]
    MissingOrderReference(String),
    #[error("Order not found. {0}")]
    OrderNotFound(String),
    #[error("Database error. {0}")]
    Database(String),
    #[error("Tenant mismatch. {0}")]
    TenantMismatch(String),
}

impl PipelineError {
    /// Transient failures are worth another attempt. Everything else will fail the same way next time.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Gateway(_) | PipelineError::OrderNotFound(_) | PipelineError::Database(_) => true,
            PipelineError::Authentication(_) |
            PipelineError::Configuration(_) |
            PipelineError::MissingOrderReference(_) |
            PipelineError::TenantMismatch(_) => false,
        }
    }
}

impl From<ReconciliationError> for PipelineError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::DatabaseError(s) => PipelineError::Database(s),
            ReconciliationError::OrderNotFound(reference) => {
                PipelineError::OrderNotFound(format!("No order matches the reference {reference}"))
            },
            ReconciliationError::TenantNotFound(id) => PipelineError::Configuration(format!("Unknown tenant {id}")),
            e @ ReconciliationError::TenantMismatch { .. } => PipelineError::TenantMismatch(e.to_string()),
        }
    }
}

/// A single, self-contained attempt at reconciling a payment. Implementations must be safe to run any number of times
/// for the same payment.
pub trait ReconciliationAttempt: Send + Sync + 'static {
    fn attempt(
        &self,
        payment_id: &str,
        tenant_id: &str,
    ) -> impl Future<Output = Result<ReconcileOutcome, PipelineError>> + Send;
}

pub struct PaymentPipeline<B> {
    api: ReconciliationApi<B>,
    gateway: GatewayClient,
}

impl<B> PaymentPipeline<B> {
    pub fn new(api: ReconciliationApi<B>, gateway: GatewayClient) -> Self {
        Self { api, gateway }
    }
}

impl<B> ReconciliationAttempt for PaymentPipeline<B>
where B: ReconciliationDatabase + TenantManagement
{
    async fn attempt(&self, payment_id: &str, tenant_id: &str) -> Result<ReconcileOutcome, PipelineError> {
        let tenant = self
            .api
            .fetch_tenant(tenant_id)
            .await?
            .ok_or_else(|| PipelineError::Configuration(format!("Unknown tenant {tenant_id}")))?;
        let record = self.gateway.fetch_payment(payment_id, &tenant).await?;
        trace!("🔁️ Payment {payment_id} is {} for order {}", record.status, record.external_reference);
        let outcome = self.api.reconcile(&record, tenant_id).await?;
        Ok(outcome)
    }
}
