use std::sync::Arc;

use log::*;
use rcn_common::Secret;
use reqwest::{header::HeaderValue, Client, Method};
use serde::de::DeserializeOwned;

use crate::{config::GatewayConfig, helpers::is_valid_payment_id, GatewayApiError, GatewayPayment};

/// Thin REST client for the payment gateway.
///
/// Credentials are per-tenant, so the bearer token is supplied on every call rather than baked into the client.
#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        access_token: &Secret<String>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let auth = HeaderValue::from_str(&format!("Bearer {}", access_token.reveal()))
            .map_err(|e| GatewayApiError::RestRequestError(format!("Access token is not a valid header value. {e}")))?;
        let response = self
            .client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| GatewayApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Fetches the authoritative state of a payment from the gateway.
    pub async fn fetch_payment(
        &self,
        payment_id: &str,
        access_token: &Secret<String>,
    ) -> Result<GatewayPayment, GatewayApiError> {
        if !is_valid_payment_id(payment_id) {
            return Err(GatewayApiError::InvalidPaymentId(payment_id.to_string()));
        }
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment #{payment_id}");
        let payment = self.rest_query::<GatewayPayment>(Method::GET, &path, access_token).await?;
        info!("Fetched payment #{payment_id} with status {}", payment.status);
        Ok(payment)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_building() {
        let api = GatewayApi::new(GatewayConfig::new("https://gateway.test/", None)).unwrap();
        assert_eq!(api.url("/v1/payments/12"), "https://gateway.test/v1/payments/12");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_request_error() {
        let _ = env_logger::try_init();
        let api = GatewayApi::new(GatewayConfig::new("http://127.0.0.1:9", None)).unwrap();
        let err = api.fetch_payment("123", &Secret::from("token")).await.expect_err("Expected a network error");
        assert!(matches!(err, GatewayApiError::RestRequestError(_)), "Unexpected error: {err}");
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected_before_sending() {
        let api = GatewayApi::new(GatewayConfig::new("http://127.0.0.1:9", None)).unwrap();
        for id in ["../x?y", "1/../../admin", "12#frag", ""] {
            let err = api.fetch_payment(id, &Secret::from("token")).await.expect_err("Expected an error");
            assert!(matches!(err, GatewayApiError::InvalidPaymentId(_)), "Unexpected error for {id}: {err}");
        }
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_before_sending() {
        let api = GatewayApi::new(GatewayConfig::default()).unwrap();
        let err = api.fetch_payment("123", &Secret::from("bad\ntoken")).await.expect_err("Expected an error");
        assert!(matches!(err, GatewayApiError::RestRequestError(_)));
    }
}
