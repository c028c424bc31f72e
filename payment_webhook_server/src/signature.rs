//! Webhook signature verification.
//!
//! The gateway signs every notification with a shared secret. The `x-signature` header carries a timestamp and an
//! HMAC-SHA256 over `{ts}.{x-request-id}.{notification id}`:
//!
//! ```text
//! x-signature: ts=1704908010,v1=618c85345248dd820d5fd456117c2ab2ef8eda45a0282ff693eac24131a5e839
//! ```
//!
//! When no secret is configured, verification is permissive: everything passes, and a warning is logged every time.
use log::*;
use rcn_common::Secret;

use crate::helpers::{calculate_hmac, constant_time_eq, parse_signature_header, signed_payload};

#[derive(Clone, Debug, Default)]
pub struct SignatureVerifier {
    secret: Option<Secret<String>>,
}

impl SignatureVerifier {
    pub fn new(secret: Option<Secret<String>>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        Self { secret }
    }

    pub fn is_permissive(&self) -> bool {
        self.secret.is_none()
    }

    /// Returns true if the notification is authentic (or if no secret is configured).
    ///
    /// Any missing input fails verification when a secret is configured.
    pub fn verify(
        &self,
        signature_header: Option<&str>,
        request_id: Option<&str>,
        notification_id: Option<&str>,
    ) -> bool {
        let Some(secret) = &self.secret else {
            warn!("🔐️ No webhook secret is configured. Accepting notification without checking its signature.");
            return true;
        };
        let (Some(header), Some(request_id), Some(notification_id)) = (signature_header, request_id, notification_id)
        else {
            warn!(
                "🔐️ Rejecting notification. Signature present: {}, request id present: {}, notification id present: {}",
                signature_header.is_some(),
                request_id.is_some(),
                notification_id.is_some()
            );
            return false;
        };
        let Some(signature) = parse_signature_header(header) else {
            warn!("🔐️ Rejecting notification {notification_id}. The signature header is malformed.");
            return false;
        };
        let payload = signed_payload(&signature.ts, request_id, notification_id);
        let expected = calculate_hmac(secret.reveal(), payload.as_bytes());
        let provided = signature.v1.to_ascii_lowercase();
        let valid = constant_time_eq(expected.as_bytes(), provided.as_bytes());
        if valid {
            trace!("🔐️ Signature for notification {notification_id} ✅️");
        } else {
            warn!("🔐️ Rejecting notification {notification_id} (request {request_id}). Invalid signature.");
        }
        valid
    }
}
