use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `data`, keyed with `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any size"),
    };
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Compares two byte strings in time that depends only on their length. Strings of different lengths are unequal
/// and are not compared at all.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The parts of a `x-signature` header that we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub ts: String,
    pub v1: String,
}

/// Parses a header of the form `ts=1704908010,v1=618c8534...`. Keys and values are trimmed and unknown keys are
/// ignored. Returns `None` unless both `ts` and `v1` are present and non-empty.
pub fn parse_signature_header(header: &str) -> Option<SignatureHeader> {
    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            trace!("🔐️ Ignoring malformed signature header segment '{part}'");
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "ts" if !value.is_empty() => ts = Some(value.to_string()),
            "v1" if !value.is_empty() => v1 = Some(value.to_string()),
            _ => {},
        }
    }
    Some(SignatureHeader { ts: ts?, v1: v1? })
}

/// The payload that the gateway signs: `{ts}.{request_id}.{notification_id}`
pub fn signed_payload(ts: &str, request_id: &str, notification_id: &str) -> String {
    format!("{ts}.{request_id}.{notification_id}")
}

/// Produces a valid `x-signature` header value for the given notification. The gateway does this on its side; we use
/// it for local tooling and tests.
pub fn sign_notification(secret: &str, ts: &str, request_id: &str, notification_id: &str) -> String {
    let v1 = calculate_hmac(secret, signed_payload(ts, request_id, notification_id).as_bytes());
    format!("ts={ts},v1={v1}")
}
