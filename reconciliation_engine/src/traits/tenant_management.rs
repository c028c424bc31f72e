use std::future::Future;

use crate::{db_types::Tenant, traits::ReconciliationError};

/// Read-only access to tenants.
pub trait TenantManagement: Clone + Send + Sync + 'static {
    fn fetch_tenant(&self, tenant_id: &str) -> impl Future<Output = Result<Option<Tenant>, ReconciliationError>> + Send;
}
