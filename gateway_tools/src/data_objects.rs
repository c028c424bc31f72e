use serde::{Deserialize, Serialize};

/// A payment as returned by the gateway's `GET /v1/payments/{id}` endpoint.
///
/// Only the fields that take part in reconciliation are modelled; everything else in the response is ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GatewayPayment {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    /// The merchant's order id, as attached to the checkout preference.
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub payer: Option<GatewayPayer>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_approved: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GatewayPayer {
    #[serde(default)]
    pub email: Option<String>,
}

impl GatewayPayment {
    pub fn payer_email(&self) -> Option<&str> {
        self.payer.as_ref().and_then(|p| p.email.as_deref())
    }

    /// The order reference, if the gateway supplied a non-empty one.
    pub fn order_reference(&self) -> Option<&str> {
        self.external_reference.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
