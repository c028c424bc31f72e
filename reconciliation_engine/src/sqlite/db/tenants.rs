use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewTenant, Tenant};

pub async fn fetch_tenant(tenant_id: &str, conn: &mut SqliteConnection) -> Result<Option<Tenant>, sqlx::Error> {
    let tenant = sqlx::query_as("SELECT * FROM tenants WHERE id = $1").bind(tenant_id).fetch_optional(conn).await?;
    Ok(tenant)
}

/// Inserts a tenant. Tenants are managed elsewhere; this is used for seeding and tests.
pub async fn insert_tenant(tenant: NewTenant, conn: &mut SqliteConnection) -> Result<Tenant, sqlx::Error> {
    let tenant: Tenant = sqlx::query_as(
        r#"
            INSERT INTO tenants (id, name, contact_email, currency, gateway_access_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(tenant.id)
    .bind(tenant.name)
    .bind(tenant.contact_email)
    .bind(tenant.currency)
    .bind(tenant.gateway_access_token)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Tenant {} inserted", tenant.id);
    Ok(tenant)
}
