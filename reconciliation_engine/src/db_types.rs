use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use rcn_common::Money;
use rcn_common::{helpers::non_empty, Secret};
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed but not yet settled.
    Pending,
    /// The order has been paid for and is confirmed.
    Completed,
    /// The order has been cancelled by the customer or the merchant.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
/// Payment status of an order. Reconciliation only ever moves this from `Pending` to `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    Pending,
    Paid,
    Refunded,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "Pending"),
            PaymentStatusType::Paid => write!(f, "Paid"),
            PaymentStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   GatewaySnapshot     ---------------------------------------------------------
/// The normalized copy of the last gateway response seen for an order. Kept for audit and debugging only; nothing
/// reads it back to make decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub payment_id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub payment_method_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub currency_id: Option<String>,
    pub payer_email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    /// When this snapshot was taken
    pub received_at: DateTime<Utc>,
}

impl GatewaySnapshot {
    /// The amount the gateway says was charged, rounded to the cent.
    pub fn amount(&self) -> Option<Money> {
        let amount = self.transaction_amount?;
        Money::try_from(amount)
            .map_err(|e| error!("Gateway payment {} has an unusable amount. {e}", self.payment_id))
            .ok()
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: String,
    pub total: Money,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub payment_method: Option<String>,
    /// The last external payment id the gateway notified us about
    pub gateway_payment_id: Option<String>,
    /// The raw gateway status string from the last notification
    pub gateway_payment_status: Option<String>,
    pub gateway_metadata: Option<Json<GatewaySnapshot>>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatusType::Paid
    }

    /// Only a pending payment on a live order can be settled. Paid, refunded and cancelled orders are left alone.
    pub fn is_payable(&self) -> bool {
        self.payment_status == PaymentStatusType::Pending && self.status != OrderStatusType::Cancelled
    }

    pub fn snapshot(&self) -> Option<&GatewaySnapshot> {
        self.gateway_metadata.as_ref().map(|j| &j.0)
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price
    pub price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order as created by the order-placement flow. Reconciliation never creates orders; this exists for seeding
/// databases and for fixtures.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub tenant_id: String,
    pub total: Money,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
}

impl NewOrder {
    pub fn new(id: OrderId, tenant_id: &str, total: Money) -> Self {
        Self {
            id,
            tenant_id: tenant_id.to_string(),
            total,
            payment_method: None,
            customer_email: None,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_customer_email(mut self, email: &str) -> Self {
        self.customer_email = Some(email.to_string());
        self
    }

    pub fn with_item(mut self, product_id: &str, product_name: &str, quantity: i64, price: Money) -> Self {
        self.items.push(NewOrderItem {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            quantity,
            price,
        });
        self
    }
}

//--------------------------------------        Tenant         ---------------------------------------------------------
#[derive(Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// Where tenant-facing notifications (e.g. payment confirmations) are sent
    pub contact_email: Option<String>,
    /// ISO 4217 currency code that order totals are denominated in
    pub currency: String,
    #[serde(skip_serializing)]
    pub gateway_access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tenant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("contact_email", &self.contact_email)
            .field("currency", &self.currency)
            .field("gateway_access_token", &self.gateway_access_token.as_ref().map(|_| "****"))
            .finish()
    }
}

impl Tenant {
    /// The tenant's own gateway access token, if one is configured.
    pub fn access_token(&self) -> Option<Secret<String>> {
        non_empty(self.gateway_access_token.clone()).map(Secret::new)
    }
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub currency: String,
    pub gateway_access_token: Option<String>,
}

impl NewTenant {
    pub fn new(id: &str, name: &str, currency: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            contact_email: None,
            currency: currency.to_string(),
            gateway_access_token: None,
        }
    }

    pub fn with_contact_email(mut self, email: &str) -> Self {
        self.contact_email = Some(email.to_string());
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.gateway_access_token = Some(token.to_string());
        self
    }
}
