use std::time::Duration;

use log::*;
use rcn_common::{helpers::non_empty, Secret};

pub const DEFAULT_GATEWAY_API_URL: &str = "https://api.mercadopago.com";
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API, without a trailing slash.
    pub api_url: String,
    /// Process-wide access token. Used for tenants that don't carry their own gateway credentials.
    pub default_access_token: Option<Secret<String>>,
    /// Timeout applied to every outbound request.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_GATEWAY_API_URL.to_string(), default_access_token: None, timeout: DEFAULT_GATEWAY_TIMEOUT }
    }
}

impl GatewayConfig {
    pub fn new(api_url: &str, default_access_token: Option<Secret<String>>) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            default_access_token,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PWS_GATEWAY_API_URL").unwrap_or_else(|_| {
            info!("PWS_GATEWAY_API_URL not set, using {DEFAULT_GATEWAY_API_URL} as default");
            DEFAULT_GATEWAY_API_URL.to_string()
        });
        let default_access_token = non_empty(std::env::var("PWS_GATEWAY_ACCESS_TOKEN").ok()).map(Secret::new);
        if default_access_token.is_none() {
            warn!(
                "PWS_GATEWAY_ACCESS_TOKEN not set. Only tenants with their own gateway access token can be reconciled."
            );
        }
        let timeout = std::env::var("PWS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for PWS_GATEWAY_TIMEOUT_SECS ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        let mut config = Self::new(&api_url, default_access_token);
        config.timeout = timeout;
        config
    }
}
