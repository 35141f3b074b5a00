//! Order-independent JSON rendering used for cache keys.

use serde_json::{Map, Value};

/// Compact JSON text with object keys sorted at every depth.
pub fn to_canonical_string(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Rebuild `value` with keys inserted in sorted order at every depth.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|left, right| left.0.cmp(right.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
