//! Recursive sanitizer for emitted JSON payloads.
//!
//! Nulls, empty objects and empty arrays are removed at every depth. A
//! container that only held such values becomes empty itself and is removed
//! from its parent in turn.

use serde::Serialize;
use serde_json::{Map, Value};

/// Prune `value` and return the cleaned tree.
///
/// The root is returned even when it ends up empty.
pub fn prune_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(prune_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().filter_map(prune_child).collect()),
        other => other,
    }
}

/// Serialize `payload` and prune the result.
pub fn to_pruned_value<T: Serialize + ?Sized>(payload: &T) -> Result<Value, serde_json::Error> {
    Ok(prune_value(serde_json::to_value(payload)?))
}

fn prune_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter_map(|(key, sub)| prune_child(sub).map(|sub| (key, sub)))
        .collect()
}

fn prune_child(value: Value) -> Option<Value> {
    match prune_value(value) {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        kept => Some(kept),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_nulls_and_empty_containers_recursively() {
        let raw = json!({
            "name": "frame",
            "gps": { "latitude_deg": null, "nested": { "x": null } },
            "tags": [null, {}, [], "a"],
            "empty_list": [],
            "zero": 0,
            "blank": ""
        });
        let pruned = prune_value(raw);
        assert_eq!(
            pruned,
            json!({ "name": "frame", "tags": ["a"], "zero": 0, "blank": "" })
        );
    }

    #[test]
    fn root_survives_even_when_empty() {
        assert_eq!(prune_value(json!({ "a": null })), json!({}));
    }

    #[test]
    fn serializable_structs_are_pruned() {
        #[derive(Serialize)]
        struct Payload {
            kept: u32,
            dropped: Option<String>,
        }
        let value = to_pruned_value(&Payload {
            kept: 3,
            dropped: None,
        })
        .expect("serialize");
        assert_eq!(value, json!({ "kept": 3 }));
    }
}
