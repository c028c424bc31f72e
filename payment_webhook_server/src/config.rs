use std::{env, str::FromStr, time::Duration};

use gateway_tools::GatewayConfig;
use log::*;
use rcn_common::{
    helpers::{non_empty, parse_boolean_flag},
    Secret,
};

const DEFAULT_PWS_HOST: &str = "127.0.0.1";
const DEFAULT_PWS_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/payments.db";
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(2000);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway REST API settings, including the process-wide default access token.
    pub gateway: GatewayConfig,
    /// The shared secret used to sign webhook notifications. When it is `None`, every notification is accepted.
    pub webhook_secret: Option<Secret<String>>,
    pub retry: RetryConfig,
    /// Buffer size of the event hook channels.
    pub event_buffer_size: usize,
    /// If true, `sim_{orderId}_{status}_{id}` payment ids are resolved locally instead of calling the gateway.
    pub gateway_simulation: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// The delay before the second attempt. Each subsequent delay doubles.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS, base_delay: DEFAULT_RETRY_BASE_DELAY }
    }
}

impl RetryConfig {
    /// The delay before retrying after attempt number `attempt` (1-based) failed: `base_delay * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PWS_HOST.to_string(),
            port: DEFAULT_PWS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            gateway: GatewayConfig::default(),
            webhook_secret: None,
            retry: RetryConfig::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            gateway_simulation: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PWS_HOST").ok().unwrap_or_else(|| DEFAULT_PWS_HOST.into());
        let port = parse_env("PWS_PORT", DEFAULT_PWS_PORT);
        let database_url = env::var("PWS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PWS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let gateway = GatewayConfig::new_from_env_or_default();
        let webhook_secret = non_empty(env::var("PWS_WEBHOOK_SECRET").ok()).map(Secret::new);
        if webhook_secret.is_none() {
            warn!(
                "🚨️ PWS_WEBHOOK_SECRET is not set. Webhook signatures will NOT be checked, and any caller can trigger \
                 reconciliation. Do not run a production instance like this."
            );
        }
        let max_attempts = match parse_env("PWS_RETRY_MAX_ATTEMPTS", DEFAULT_RETRY_MAX_ATTEMPTS) {
            0 => {
                warn!("🪛️ PWS_RETRY_MAX_ATTEMPTS must be at least 1. Using 1.");
                1
            },
            n => n,
        };
        let base_delay = Duration::from_millis(parse_env(
            "PWS_RETRY_BASE_DELAY_MS",
            DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
        ));
        let event_buffer_size = parse_env("PWS_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let gateway_simulation = parse_boolean_flag(env::var("PWS_GATEWAY_SIMULATION").ok(), true);
        if gateway_simulation && webhook_secret.is_none() {
            warn!(
                "🚨️ Gateway simulation is enabled while webhook signatures are not checked. Anyone can mark orders as \
                 paid with a simulated payment id. Set PWS_GATEWAY_SIMULATION=false or configure PWS_WEBHOOK_SECRET."
            );
        }
        Self {
            host,
            port,
            database_url,
            gateway,
            webhook_secret,
            retry: RetryConfig { max_attempts, base_delay },
            event_buffer_size,
            gateway_simulation,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
