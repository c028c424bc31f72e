//! Request handlers for the server.
//!
//! * `GET /health` answers 200 for liveness probes.
//! * `POST /payments/webhook` receives gateway notifications. It always answers `200 OK` with an empty body, whatever
//!   the request contains, and processes the notification in a detached task afterwards.
use actix_web::{get, post, rt, web, HttpRequest, HttpResponse, Responder};
use log::*;

use crate::webhook::{WebhookEvent, WebhookReceiver, REQUEST_ID_HEADER, SIGNATURE_HEADER};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Webhook  ----------------------------------------------------
#[post("/payments/webhook")]
pub async fn payment_webhook(req: HttpRequest, body: web::Bytes, receiver: web::Data<WebhookReceiver>) -> HttpResponse {
    trace!("💻️ Received payment webhook request: {}", req.query_string());
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
    let event = WebhookEvent::from_parts(req.query_string(), header(SIGNATURE_HEADER), header(REQUEST_ID_HEADER), &body);
    let receiver = receiver.into_inner();
    rt::spawn(async move {
        let disposition = receiver.process(event);
        debug!("💻️ Webhook notification processed. {disposition}");
    });
    HttpResponse::Ok().finish()
}
