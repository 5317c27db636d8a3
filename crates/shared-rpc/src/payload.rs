//! Request payload normalization.
//!
//! Callers are inconsistent about how they encode simple values: an id may
//! arrive as `"p1"`, as `"\"p1\""` (a JSON string holding a JSON string), or
//! as bare `p1`. Handlers see one canonical JSON value.

use serde_json::Value;

/// Levels of string-encoded JSON peeled off before giving up.
const MAX_UNWRAP_DEPTH: usize = 4;

/// Turn a raw message body into the value handed to a handler.
///
/// - Empty body: `null`
/// - Valid JSON: parsed, then string layers that themselves hold a JSON
///   string, array or object are unwrapped
/// - Anything else: trimmed text with surrounding quotes stripped
pub fn normalize_payload(body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => unwrap_nested(value),
        Err(_) => Value::String(strip_quotes(trimmed).to_string()),
    }
}

fn unwrap_nested(mut value: Value) -> Value {
    for _ in 0..MAX_UNWRAP_DEPTH {
        let Value::String(inner) = &value else {
            break;
        };
        match serde_json::from_str::<Value>(inner.trim()) {
            Ok(nested @ (Value::String(_) | Value::Array(_) | Value::Object(_))) => value = nested,
            _ => break,
        }
    }
    value
}

fn strip_quotes(text: &str) -> &str {
    let mut text = text;
    while text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')))
    {
        text = text[1..text.len() - 1].trim();
    }
    text
}
