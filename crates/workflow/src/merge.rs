//! Per-field merge policies applied by [`crate::state::WorkflowState::apply`].
//!
//! Every policy is deterministic and idempotent: applying the same update
//! twice leaves the state as applying it once.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::warn;

use crate::state::Message;

/// Append messages with unseen ids; a known id replaces the stored message
/// in place.
pub fn append_by_id(existing: &mut Vec<Message>, incoming: Vec<Message>) {
    for message in incoming {
        match existing.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message,
            None => existing.push(message),
        }
    }
}

/// Overlay incoming keys without dropping unrelated existing ones. Nested
/// objects are merged the same way.
pub fn merge_additive(existing: &mut BTreeMap<String, Value>, incoming: BTreeMap<String, Value>) {
    for (key, value) in incoming {
        let merged = match (existing.remove(&key), value) {
            (Some(Value::Object(current)), Value::Object(update)) => {
                let mut nested: BTreeMap<String, Value> = current.into_iter().collect();
                merge_additive(&mut nested, update.into_iter().collect());
                Value::Object(nested.into_iter().collect())
            }
            (_, value) => value,
        };
        existing.insert(key, merged);
    }
}

/// Scalar policy: the latest present value wins.
pub fn overwrite<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

/// Keep the first value; a later different value is dropped.
pub fn write_once<T: PartialEq + Debug>(slot: &mut Option<T>, incoming: Option<T>, field: &str) {
    match (slot.as_ref(), incoming) {
        (None, Some(value)) => *slot = Some(value),
        (Some(current), Some(value)) if *current != value => {
            warn!(field, "Ignoring second value for write-once field");
        }
        _ => {}
    }
}

/// Serialize any value into a plain JSON mapping. Non-object values land
/// under a `value` key.
pub fn normalize_mapping<T: Serialize>(value: &T) -> serde_json::Result<BTreeMap<String, Value>> {
    Ok(match serde_json::to_value(value)? {
        Value::Object(map) => map.into_iter().collect(),
        Value::Null => BTreeMap::new(),
        other => BTreeMap::from([("value".to_string(), other)]),
    })
}
