//! `SqliteDatabase` is the concrete SQLite backend for the reconciliation engine.
//!
//! It implements the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, new_pool, orders, tenants};
use crate::{
    db_types::{GatewaySnapshot, NewOrder, NewTenant, Order, OrderId, OrderItem, Tenant},
    traits::{ReconciliationDatabase, ReconciliationError, TenantManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_external_reference(&self, reference: &str) -> Result<Option<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(&OrderId::from(reference), &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn record_gateway_snapshot(
        &self,
        order_id: &OrderId,
        snapshot: &GatewaySnapshot,
    ) -> Result<Order, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_gateway_snapshot(order_id, snapshot, &mut tx)
            .await?
            .ok_or_else(|| ReconciliationError::OrderNotFound(order_id.as_str().to_string()))?;
        tx.commit().await?;
        Ok(order)
    }

    /// The transition is committed before this returns, so callers can publish events on a `Some` result.
    async fn mark_order_paid(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::mark_order_paid(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl TenantManagement for SqliteDatabase {
    async fn fetch_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let tenant = tenants::fetch_tenant(tenant_id, &mut conn).await?;
        Ok(tenant)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `PWS_DATABASE_URL` environment variable (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object for the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new SQLite connection pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Brings the schema up to date with the embedded migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let tenant = tenants::insert_tenant(tenant, &mut conn).await?;
        Ok(tenant)
    }

    /// Inserts an order and its items in a single transaction.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }
}
