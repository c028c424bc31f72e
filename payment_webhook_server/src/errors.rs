use gateway_tools::GatewayApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl From<GatewayApiError> for ServerError {
    fn from(e: GatewayApiError) -> Self {
        Self::InitializeError(format!("Could not create the gateway client. {e}"))
    }
}
