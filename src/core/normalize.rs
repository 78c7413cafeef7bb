//! Response Normalization
//!
//! Webhook workflows answer in all sorts of shapes. The enhanced text is
//! found by probing fixed, ordered lists of field names, so the result only
//! depends on the payload and never on how the object happens to be laid out.

use serde_json::Value;

/// Tried first, in order
pub const PRIMARY_KEYS: [&str; 4] = ["enhancedText", "enhanced_text", "text", "result"];

/// Tried when the payload is an object without any primary key
pub const FALLBACK_KEYS: [&str; 5] = ["enhanced", "improved", "output", "response", "content"];

/// Null, false, zero and the empty string count as absent
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| is_truthy(value))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pull the enhanced text out of a relay payload
pub fn normalize_payload(payload: &Value) -> Option<String> {
    if let Some(value) = first_present(payload, &PRIMARY_KEYS) {
        return Some(render(value));
    }
    if let Value::String(text) = payload {
        return (!text.is_empty()).then(|| text.clone());
    }
    if payload.is_object() {
        return first_present(payload, &FALLBACK_KEYS).map(render);
    }
    None
}
