use chrono::{DateTime, NaiveDateTime, Utc};

/// The gateway reports timestamps as RFC 3339 strings with a local offset and millisecond precision
/// (`2024-03-01T10:15:00.000-04:00`). Older payloads sometimes omit the offset, in which case UTC is assumed.
pub fn parse_gateway_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)).ok().or_else(|| {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
    })
}

/// Payment ids end up in the request path, so only plain identifier characters are allowed.
pub fn is_valid_payment_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
