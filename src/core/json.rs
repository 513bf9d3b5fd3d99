//! Cycle-guarded JSON stringification for log arguments
//!
//! Serialization of log payloads must never fail or recurse without bound:
//! any object reference that repeats within one serialization renders as the
//! literal string `"[Circular]"` instead. `serde_json::Value` trees cannot
//! alias, so the repeat check degenerates to a depth bound, which also covers
//! pathologically deep payloads.

use serde_json::Value;

const MAX_DEPTH: usize = 128;

/// Serialize a value to compact JSON, substituting `"[Circular]"` at any
/// point of recurrence instead of failing.
pub fn stringify(value: &Value) -> String {
    let guarded = guard(value, 0);
    serde_json::to_string(&guarded).unwrap_or_else(|_| "\"[Circular]\"".to_string())
}

/// Like [`stringify`] with the given indentation width.
pub fn stringify_pretty(value: &Value) -> String {
    let guarded = guard(value, 0);
    serde_json::to_string_pretty(&guarded).unwrap_or_else(|_| "\"[Circular]\"".to_string())
}

fn guard(value: &Value, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return Value::String("[Circular]".to_string());
    }
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| guard(v, depth + 1)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), guard(v, depth + 1)))
                .collect(),
        ),
        other => other.clone(),
    }
}
