//! Field redaction applied before log entries are written.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Replacement written in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

const DENYLIST_KEYS: [&str; 8] = [
    "secret",
    "token",
    "authorization",
    "password",
    "publishable_key",
    "api_key",
    "cookie",
    "account_number",
];

/// Returns true when a field name suggests it carries a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

pub(crate) fn sanitize_fields(fields: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let value = sanitize_value(&key, &value);
            (key, value)
        })
        .collect()
}

/// Redact `value` if `key` is sensitive or the value looks like a bearer credential.
pub fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_sensitive_value(s) => Value::String(REDACTED.to_string()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), sanitize_value(k, v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| sanitize_value(key, item)).collect()),
        _ => value.clone(),
    }
}

fn looks_like_sensitive_value(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    // Client secrets are `<session>_secret_<random>`.
    lower.starts_with("bearer ") || lower.contains("_secret_")
}
