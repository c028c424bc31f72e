use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use reconciliation_engine::{
    events::{EventHandlers, EventHooks},
    ReconciliationApi,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::gateway::GatewayClient,
    notifications::{LogMailer, Mailer, NotificationDispatcher},
    pipeline::PaymentPipeline,
    retry::{start_retry_worker, RetryCoordinator, RetryQueue, RetryScheduler},
    routes::{health, payment_webhook},
    signature::SignatureVerifier,
    webhook::WebhookReceiver,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let services = start_services(&config, db, LogMailer)?;
    info!("🚀️ {} background workers started", services.workers.len());
    let srv = create_server_instance(config, services.receiver)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Everything behind the webhook route.
pub struct Services {
    pub receiver: WebhookReceiver,
    /// Event hook handlers and the retry worker. These run for the lifetime of the process.
    pub workers: Vec<JoinHandle<()>>,
}

/// Wires the pipeline together and starts its background workers: notification hooks on paid orders, the retry worker,
/// and the webhook receiver that feeds it. Must be called from within a tokio runtime.
pub fn start_services<M: Mailer>(
    config: &ServerConfig,
    db: SqliteDatabase,
    mailer: M,
) -> Result<Services, ServerError> {
    let mut hooks = EventHooks::default();
    NotificationDispatcher::new(mailer).register(&mut hooks);
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    let mut workers = handlers.start_handlers();

    let api = ReconciliationApi::new(db, producers);
    let gateway = GatewayClient::new(config.gateway.clone(), config.gateway_simulation)?;
    let (queue, jobs) = RetryQueue::new();
    let scheduler: Arc<dyn RetryScheduler> = Arc::new(queue);
    let coordinator = RetryCoordinator::new(PaymentPipeline::new(api, gateway), Arc::clone(&scheduler), config.retry);
    workers.push(start_retry_worker(jobs, coordinator));

    let verifier = SignatureVerifier::new(config.webhook_secret.clone());
    if verifier.is_permissive() {
        warn!("🚨️ Webhook signature verification is DISABLED.");
    }
    Ok(Services { receiver: WebhookReceiver::new(verifier, scheduler), workers })
}

pub fn create_server_instance(config: ServerConfig, receiver: WebhookReceiver) -> Result<Server, ServerError> {
    let receiver = web::Data::new(receiver);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pws::access_log"))
            .app_data(receiver.clone())
            .service(health)
            .service(payment_webhook)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
