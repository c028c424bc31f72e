//! # Simulation mode
//!
//! Payment ids of the form `sim_{orderId}_{status}_{numericId}` never reach the gateway. They are parsed into a
//! synthetic [`GatewayPayment`] instead, so that the full webhook → reconciliation path can be exercised in tests and
//! staging environments without a live gateway account.
//!
//! ```rust
//! use gateway_tools::simulation::parse_simulated_payment;
//!
//! let payment = parse_simulated_payment("sim_order123_approved_999").unwrap();
//! assert_eq!(payment.id, 999);
//! assert_eq!(payment.status, "approved");
//! assert_eq!(payment.external_reference.as_deref(), Some("order123"));
//! ```
//!
//! The order id may itself contain underscores. Statuses that contain underscores (`in_process`, `in_mediation`,
//! `charged_back`) are recognised as a unit; any other status is taken to be the last segment before the numeric id.
use log::*;

use crate::{GatewayApiError, GatewayPayment};

pub const SIMULATION_PREFIX: &str = "sim_";

const COMPOUND_STATUSES: [&str; 3] = ["in_process", "in_mediation", "charged_back"];

pub fn is_simulated(payment_id: &str) -> bool {
    payment_id.starts_with(SIMULATION_PREFIX)
}

/// Builds the synthetic gateway response for a simulated payment id.
pub fn parse_simulated_payment(payment_id: &str) -> Result<GatewayPayment, GatewayApiError> {
    let invalid = || GatewayApiError::InvalidSimulatedId(payment_id.to_string());
    let body = payment_id.strip_prefix(SIMULATION_PREFIX).ok_or_else(invalid)?;
    let (rest, numeric) = body.rsplit_once('_').ok_or_else(invalid)?;
    let id = numeric.parse::<u64>().map_err(|_| invalid())?;
    let (order_id, status) = COMPOUND_STATUSES
        .iter()
        .find_map(|s| rest.strip_suffix(s).and_then(|o| o.strip_suffix('_')).map(|o| (o, *s)))
        .or_else(|| rest.rsplit_once('_'))
        .ok_or_else(invalid)?;
    if order_id.is_empty() || status.is_empty() {
        return Err(invalid());
    }
    trace!("🧪️ Simulated payment {payment_id}: order {order_id}, status {status}, id {id}");
    Ok(GatewayPayment {
        id,
        status: status.to_string(),
        status_detail: Some("simulated".to_string()),
        external_reference: Some(order_id.to_string()),
        payment_method_id: Some("simulated".to_string()),
        ..Default::default()
    })
}
