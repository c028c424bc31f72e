/// Parse a boolean flag from a string value, or return the given default value otherwise.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively. Anything else yields `default`.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Returns `None` for missing, empty or whitespace-only values. Handy for optional credentials coming from the
/// environment or from nullable database columns.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
