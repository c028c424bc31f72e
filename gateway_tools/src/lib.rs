//! Client-side tooling for the payment gateway's REST API.
//!
//! * [`GatewayApi`] performs authenticated lookups against the gateway (`GET /v1/payments/{id}`).
//! * [`simulation`] turns structured fake payment ids (`sim_{orderId}_{status}_{numericId}`) into gateway responses
//!   without touching the network. Integration tests rely on it to drive the full reconciliation path
//!   deterministically.
mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;
pub mod simulation;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{GatewayPayer, GatewayPayment};
pub use error::GatewayApiError;
