use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use rcn_common::Money;
use reconciliation_engine::db_types::{Order, OrderId, OrderItem, OrderStatusType, PaymentStatusType, Tenant};

pub fn paid_order(id: &str) -> Order {
    Order {
        payment_status: PaymentStatusType::Paid,
        status: OrderStatusType::Completed,
        ..pending_order(id)
    }
}

pub fn pending_order(id: &str) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::from(id),
        tenant_id: "barber-shop".into(),
        total: Money::from_major(100),
        status: OrderStatusType::Pending,
        payment_status: PaymentStatusType::Pending,
        payment_method: None,
        gateway_payment_id: None,
        gateway_payment_status: None,
        gateway_metadata: None,
        customer_email: Some("customer@example.com".into()),
        created_at: now,
        updated_at: now,
    }
}

pub fn order_items(id: &str) -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: 1,
            order_id: OrderId::from(id),
            product_id: "haircut".into(),
            product_name: "Haircut".into(),
            quantity: 1,
            price: Money::from_major(60),
        },
        OrderItem {
            id: 2,
            order_id: OrderId::from(id),
            product_id: "shampoo".into(),
            product_name: "Shampoo".into(),
            quantity: 2,
            price: Money::from_major(20),
        },
    ]
}

pub fn tenant() -> Tenant {
    let now = Utc::now();
    Tenant {
        id: "barber-shop".into(),
        name: "Barber Shop".into(),
        contact_email: Some("owner@barber.example.com".into()),
        currency: "ARS".into(),
        gateway_access_token: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn call_service(
    request: TestRequest,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = request.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
