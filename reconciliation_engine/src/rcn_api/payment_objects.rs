use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{GatewaySnapshot, Order};

//--------------------------------------  GatewayPaymentStatus  --------------------------------------------------------
/// The payment status as reported by the gateway. Only `Approved` moves an order to paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GatewayPaymentStatus {
    Approved,
    Pending,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    /// A status string we don't recognise. It is recorded, but never acted on.
    Other(String),
}

impl GatewayPaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, GatewayPaymentStatus::Approved)
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayPaymentStatus::Approved => "approved",
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::Authorized => "authorized",
            GatewayPaymentStatus::InProcess => "in_process",
            GatewayPaymentStatus::InMediation => "in_mediation",
            GatewayPaymentStatus::Rejected => "rejected",
            GatewayPaymentStatus::Cancelled => "cancelled",
            GatewayPaymentStatus::Refunded => "refunded",
            GatewayPaymentStatus::ChargedBack => "charged_back",
            GatewayPaymentStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for GatewayPaymentStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "authorized" => Self::Authorized,
            "in_process" => Self::InProcess,
            "in_mediation" => Self::InMediation,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for GatewayPaymentStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<GatewayPaymentStatus> for String {
    fn from(value: GatewayPaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//--------------------------------------     PaymentRecord     ---------------------------------------------------------
/// The normalized, provider-independent view of a gateway payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: u64,
    pub status: GatewayPaymentStatus,
    /// Our order id, as the gateway knows it
    pub external_reference: String,
    pub status_detail: Option<String>,
    pub payment_method_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub currency_id: Option<String>,
    pub payer_email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn new<S: Into<GatewayPaymentStatus>>(id: u64, status: S, external_reference: &str) -> Self {
        Self {
            id,
            status: status.into(),
            external_reference: external_reference.to_string(),
            status_detail: None,
            payment_method_id: None,
            transaction_amount: None,
            currency_id: None,
            payer_email: None,
            created_at: None,
            approved_at: None,
        }
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method_id = Some(method.to_string());
        self
    }

    /// The audit copy of this record that gets stored against the order.
    pub fn snapshot(&self) -> GatewaySnapshot {
        GatewaySnapshot {
            payment_id: self.id.to_string(),
            status: self.status.to_string(),
            status_detail: self.status_detail.clone(),
            payment_method_id: self.payment_method_id.clone(),
            transaction_amount: self.transaction_amount,
            currency_id: self.currency_id.clone(),
            payer_email: self.payer_email.clone(),
            created_at: self.created_at,
            approved_at: self.approved_at,
            received_at: Utc::now(),
        }
    }
}

//--------------------------------------   ReconcileOutcome    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// This reconciliation moved the order from pending to paid.
    Paid(Order),
    /// The payment is approved, but the order had already been paid. Only the gateway metadata was refreshed.
    AlreadyPaid(Order),
    /// The payment is not approved. Its status was recorded and the order left as it was.
    Recorded(Order, GatewayPaymentStatus),
    /// The payment is approved, but the order was refunded or cancelled. Only the gateway metadata was refreshed.
    NotPayable(Order),
}

impl ReconcileOutcome {
    pub fn order(&self) -> &Order {
        match self {
            ReconcileOutcome::Paid(o) |
            ReconcileOutcome::AlreadyPaid(o) |
            ReconcileOutcome::Recorded(o, _) |
            ReconcileOutcome::NotPayable(o) => o,
        }
    }

    pub fn is_paid_transition(&self) -> bool {
        matches!(self, ReconcileOutcome::Paid(_))
    }
}

impl Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileOutcome::Paid(o) => write!(f, "order {} is now paid", o.id),
            ReconcileOutcome::AlreadyPaid(o) => write!(f, "order {} was already paid", o.id),
            ReconcileOutcome::Recorded(o, s) => write!(f, "status '{s}' recorded for order {}", o.id),
            ReconcileOutcome::NotPayable(o) => {
                write!(f, "order {} is {} / {} and cannot be paid", o.id, o.status, o.payment_status)
            },
        }
    }
}
