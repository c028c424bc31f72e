//! The boundary of the reconciliation pipeline.
//!
//! The gateway redelivers any notification that isn't acknowledged quickly with a 2xx, so the route always answers
//! `200 OK` first and hands the raw request to [`WebhookReceiver::process`] in a detached task. The receiver
//! authenticates the notification and, for payment topics, schedules the first reconciliation attempt. It never waits
//! for reconciliation to finish.
use std::{fmt::Display, sync::Arc, time::Duration};

use actix_web::web;
use log::*;
use rcn_common::helpers::non_empty;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    retry::{RetryJob, RetryScheduler},
    signature::SignatureVerifier,
};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Topics that carry a payment id worth reconciling.
pub const PAYMENT_TOPICS: [&str; 2] = ["payment", "merchant_order"];

#[derive(Debug, Default, Deserialize)]
struct WebhookQuery {
    topic: Option<String>,
    id: Option<String>,
    #[serde(rename = "tenantId")]
    tenant_id: Option<String>,
}

/// An inbound notification, with the query string taking precedence over the body for `topic` and the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookEvent {
    pub topic: Option<String>,
    /// The external payment id
    pub notification_id: Option<String>,
    pub tenant_id: Option<String>,
    pub signature_header: Option<String>,
    pub request_id: Option<String>,
}

impl WebhookEvent {
    /// Assembles the event from the raw request parts. Nothing here can fail: malformed query strings and bodies just
    /// leave the corresponding fields empty.
    pub fn from_parts(
        query: &str,
        signature_header: Option<&str>,
        request_id: Option<&str>,
        body: &[u8],
    ) -> Self {
        let query = web::Query::<WebhookQuery>::from_query(query)
            .map(|q| q.into_inner())
            .unwrap_or_else(|e| {
                debug!("🪝️ Could not parse webhook query string. {e}");
                WebhookQuery::default()
            });
        let body = serde_json::from_slice::<Value>(body).ok();
        let body_topic = body.as_ref().and_then(|b| b["type"].as_str()).map(String::from);
        let body_id = body.as_ref().and_then(|b| json_id(&b["data"]["id"]));
        Self {
            topic: non_empty(query.topic).or(non_empty(body_topic)),
            notification_id: non_empty(query.id).or(non_empty(body_id)),
            tenant_id: non_empty(query.tenant_id),
            signature_header: non_empty(signature_header.map(String::from)),
            request_id: non_empty(request_id.map(String::from)),
        }
    }

    pub fn is_payment_topic(&self) -> bool {
        self.topic.as_deref().map(|t| PAYMENT_TOPICS.contains(&t)).unwrap_or(false)
    }
}

/// The gateway sends `data.id` as a string for some topics and as a number for others.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The first reconciliation attempt has been scheduled.
    Dispatched(RetryJob),
    /// Authentic, but not a topic we reconcile.
    Ignored(Option<String>),
    /// Failed signature verification.
    Rejected,
    /// Authentic payment notification that can't be acted upon.
    Incomplete(&'static str),
}

impl Display for WebhookDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookDisposition::Dispatched(job) => write!(f, "Dispatched {job}"),
            WebhookDisposition::Ignored(topic) => write!(f, "Ignored topic {}", topic.as_deref().unwrap_or("(none)")),
            WebhookDisposition::Rejected => write!(f, "Rejected"),
            WebhookDisposition::Incomplete(reason) => write!(f, "Incomplete: {reason}"),
        }
    }
}

#[derive(Clone)]
pub struct WebhookReceiver {
    verifier: SignatureVerifier,
    scheduler: Arc<dyn RetryScheduler>,
}

impl WebhookReceiver {
    pub fn new(verifier: SignatureVerifier, scheduler: Arc<dyn RetryScheduler>) -> Self {
        Self { verifier, scheduler }
    }

    pub fn process(&self, event: WebhookEvent) -> WebhookDisposition {
        let authentic = self.verifier.verify(
            event.signature_header.as_deref(),
            event.request_id.as_deref(),
            event.notification_id.as_deref(),
        );
        if !authentic {
            return WebhookDisposition::Rejected;
        }
        if !event.is_payment_topic() {
            trace!("🪝️ Ignoring notification with topic {:?}", event.topic);
            return WebhookDisposition::Ignored(event.topic);
        }
        let Some(payment_id) = event.notification_id else {
            warn!("🪝️ Payment notification without a payment id. Dropping it.");
            return WebhookDisposition::Incomplete("no payment id");
        };
        let Some(tenant_id) = event.tenant_id else {
            warn!("🪝️ Payment notification {payment_id} does not say which tenant it is for. Dropping it.");
            return WebhookDisposition::Incomplete("no tenant id");
        };
        let job = RetryJob::first(payment_id, tenant_id);
        info!("🪝️ Scheduling reconciliation of {job}");
        self.scheduler.schedule(Duration::ZERO, job.clone());
        WebhookDisposition::Dispatched(job)
    }
}
