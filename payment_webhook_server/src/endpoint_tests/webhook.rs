use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test::TestRequest, web};
use rcn_common::Secret;
use tokio::sync::mpsc::UnboundedReceiver;

use super::helpers::call_service;
use crate::{
    helpers::sign_notification,
    retry::{RetryJob, RetryQueue},
    routes::{health, payment_webhook},
    signature::SignatureVerifier,
    webhook::WebhookReceiver,
};

const SECRET: &str = "whsec_endpoint_test";

fn receiver(secret: Option<&str>) -> (WebhookReceiver, UnboundedReceiver<RetryJob>) {
    let (queue, jobs) = RetryQueue::new();
    let receiver = WebhookReceiver::new(SignatureVerifier::new(secret.map(Secret::from)), Arc::new(queue));
    (receiver, jobs)
}

async fn send(receiver: WebhookReceiver, request: TestRequest) -> (StatusCode, String) {
    let data = web::Data::new(receiver);
    call_service(request, move |cfg| {
        cfg.app_data(data).service(payment_webhook);
    })
    .await
    .expect("Request failed")
}

async fn next_job(jobs: &mut UnboundedReceiver<RetryJob>) -> Option<RetryJob> {
    tokio::time::timeout(Duration::from_millis(250), jobs.recv()).await.ok().flatten()
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = call_service(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn signed_payment_notification() {
    let _ = env_logger::try_init();
    let (receiver, mut jobs) = receiver(Some(SECRET));
    let request = TestRequest::post()
        .uri("/payments/webhook?topic=payment&id=123456&tenantId=barber-shop")
        .insert_header(("x-signature", sign_notification(SECRET, "1704908010", "req-1", "123456")))
        .insert_header(("x-request-id", "req-1"))
        .set_payload(r#"{"action":"payment.updated","type":"payment","data":{"id":"123456"}}"#);
    let (status, body) = send(receiver, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(next_job(&mut jobs).await, Some(RetryJob::first("123456", "barber-shop")));
}

#[actix_web::test]
async fn forged_notification_still_gets_200() {
    let _ = env_logger::try_init();
    let (receiver, mut jobs) = receiver(Some(SECRET));
    let request = TestRequest::post()
        .uri("/payments/webhook?topic=payment&id=123456&tenantId=barber-shop")
        .insert_header(("x-signature", sign_notification("guessed", "1704908010", "req-1", "123456")))
        .insert_header(("x-request-id", "req-1"));
    let (status, body) = send(receiver, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(next_job(&mut jobs).await, None);
}

#[actix_web::test]
async fn garbage_still_gets_200() {
    let (receiver, mut jobs) = receiver(Some(SECRET));
    let request = TestRequest::post().uri("/payments/webhook").set_payload("{{{{ definitely not json");
    let (status, body) = send(receiver, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(next_job(&mut jobs).await, None);
}

#[actix_web::test]
async fn body_fallback_in_permissive_mode() {
    let (receiver, mut jobs) = receiver(None);
    let request = TestRequest::post()
        .uri("/payments/webhook?tenantId=barber-shop")
        .set_payload(r#"{"type":"payment","data":{"id":987654}}"#);
    let (status, _) = send(receiver, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next_job(&mut jobs).await, Some(RetryJob::first("987654", "barber-shop")));
}

#[actix_web::test]
async fn unknown_topics_are_ignored() {
    let (receiver, mut jobs) = receiver(None);
    let request = TestRequest::post().uri("/payments/webhook?topic=point_integration_wh&id=5&tenantId=barber-shop");
    let (status, _) = send(receiver, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next_job(&mut jobs).await, None);
}
