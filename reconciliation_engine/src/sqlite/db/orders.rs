use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{GatewaySnapshot, NewOrder, Order, OrderId, OrderItem};

/// Returns the order with the given id, if it exists
pub async fn fetch_order_by_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the line items for an order, joined against the products table for the product name.
pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as(
        r#"
            SELECT
                order_items.id,
                order_items.order_id,
                order_items.product_id,
                products.name AS product_name,
                order_items.quantity,
                order_items.price
            FROM order_items JOIN products ON products.id = order_items.product_id
            WHERE order_items.order_id = $1
            ORDER BY order_items.id
        "#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Writes the latest gateway state against the order. The payment method is only filled in if the order doesn't
/// already have one.
pub async fn update_gateway_snapshot(
    order_id: &OrderId,
    snapshot: &GatewaySnapshot,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                gateway_payment_id = $1,
                gateway_payment_status = $2,
                gateway_metadata = $3,
                payment_method = COALESCE(payment_method, $4),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING *;
        "#,
    )
    .bind(&snapshot.payment_id)
    .bind(&snapshot.status)
    .bind(Json(snapshot))
    .bind(snapshot.payment_method_id.as_deref())
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?
    .pop();
    trace!("🗃️ Gateway snapshot for payment {} recorded against order {order_id}", snapshot.payment_id);
    Ok(order)
}

/// The conditional pending → paid transition. The `WHERE` clause is what makes repeated and concurrent calls safe:
/// only the statement that actually changes the row gets it back. Orders that are refunded or cancelled never match.
///
/// The statement is run to completion before returning. Call it inside a transaction and commit before acting on the
/// result.
pub async fn mark_order_paid(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Paid',
                status = 'Completed',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND payment_status = 'Pending' AND status <> 'Cancelled'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?
    .pop();
    match &order {
        Some(_) => debug!("🗃️ Order {order_id} marked as paid"),
        None => debug!("🗃️ Order {order_id} was not updated. It is no longer payable or does not exist"),
    }
    Ok(order)
}

/// Inserts an order along with its items. Products referenced by the items are created if they don't exist yet.
///
/// This is not atomic. Pass `&mut *tx` if you need it to be.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (id, tenant_id, total, payment_method, customer_email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(order.id.as_str())
    .bind(&order.tenant_id)
    .bind(order.total.value())
    .bind(order.payment_method)
    .bind(order.customer_email)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for item in order.items {
        sqlx::query(
            r#"
                INSERT INTO products (id, tenant_id, name, price) VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING;
            "#,
        )
        .bind(&item.product_id)
        .bind(&order.tenant_id)
        .bind(&item.product_name)
        .bind(item.price.value())
        .execute(&mut *conn)
        .await?;
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)")
            .bind(order.id.as_str())
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price.value())
            .execute(&mut *conn)
            .await?;
    }
    debug!("📝️ Order {} inserted for tenant {}", inserted.id, inserted.tenant_id);
    Ok(inserted)
}
