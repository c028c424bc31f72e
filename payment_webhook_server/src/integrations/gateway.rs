//! The gateway side of a reconciliation attempt: pick the right credentials for the tenant, fetch the payment (or
//! simulate it), and normalize the response into a [`PaymentRecord`].
use gateway_tools::{
    helpers::parse_gateway_timestamp,
    simulation::{is_simulated, parse_simulated_payment},
    GatewayApi,
    GatewayApiError,
    GatewayConfig,
    GatewayPayment,
};
use log::*;
use rcn_common::Secret;
use reconciliation_engine::{db_types::Tenant, PaymentRecord};

use crate::pipeline::PipelineError;

#[derive(Clone)]
pub struct GatewayClient {
    api: GatewayApi,
    simulation: bool,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, simulation: bool) -> Result<Self, GatewayApiError> {
        let api = GatewayApi::new(config)?;
        if simulation {
            info!("🧪️ Gateway simulation is enabled. Payment ids starting with 'sim_' will not reach the gateway.");
        }
        Ok(Self { api, simulation })
    }

    /// Fetches the payment as the gateway sees it.
    ///
    /// Simulated ids are resolved before credentials are looked at, so they work on deployments without any gateway
    /// credentials.
    pub async fn fetch_payment(&self, payment_id: &str, tenant: &Tenant) -> Result<PaymentRecord, PipelineError> {
        let payment = if self.simulation && is_simulated(payment_id) {
            debug!("🧪️ Resolving simulated payment {payment_id} for tenant {}", tenant.id);
            parse_simulated_payment(payment_id).map_err(classify_gateway_error)?
        } else {
            let token = self.access_token_for(tenant)?;
            self.api.fetch_payment(payment_id, &token).await.map_err(classify_gateway_error)?
        };
        payment_record(payment)
    }

    /// The tenant's own token, falling back to the process-wide default.
    fn access_token_for(&self, tenant: &Tenant) -> Result<Secret<String>, PipelineError> {
        tenant
            .access_token()
            .or_else(|| self.api.config().default_access_token.clone().filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "Tenant {} has no gateway access token, and no default token is configured",
                    tenant.id
                ))
            })
    }
}

fn classify_gateway_error(e: GatewayApiError) -> PipelineError {
    match e {
        GatewayApiError::QueryError { status: 401 | 403, message } => {
            PipelineError::Authentication(format!("The gateway rejected our credentials. {message}"))
        },
        GatewayApiError::InvalidSimulatedId(id) => {
            PipelineError::MissingOrderReference(format!("Malformed simulated payment id {id}"))
        },
        GatewayApiError::InvalidPaymentId(id) => {
            PipelineError::MissingOrderReference(format!("Malformed payment id {id:?}"))
        },
        GatewayApiError::Initialization(s) => PipelineError::Configuration(s),
        e => PipelineError::Gateway(e.to_string()),
    }
}

/// Normalizes a gateway payment. A payment that doesn't point at an order can never be reconciled.
pub fn payment_record(payment: GatewayPayment) -> Result<PaymentRecord, PipelineError> {
    let external_reference = payment.order_reference().map(str::to_string).ok_or_else(|| {
        PipelineError::MissingOrderReference(format!("Payment {} has no external reference", payment.id))
    })?;
    let payer_email = payment.payer_email().map(str::to_string);
    Ok(PaymentRecord {
        id: payment.id,
        status: payment.status.as_str().into(),
        external_reference,
        status_detail: payment.status_detail,
        payment_method_id: payment.payment_method_id,
        transaction_amount: payment.transaction_amount,
        currency_id: payment.currency_id,
        payer_email,
        created_at: payment.date_created.as_deref().and_then(parse_gateway_timestamp),
        approved_at: payment.date_approved.as_deref().and_then(parse_gateway_timestamp),
    })
}
