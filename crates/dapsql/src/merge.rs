//! Structural deep-merge of configuration documents.
//!
//! Used to fold a partial reconfiguration into the active configuration
//! before a full recompilation.

use crate::value::{Mapping, Value};

/// Merge `incoming` into `base`, returning a new value.
///
/// When both sides are mappings the result holds the union of their keys;
/// keys present on both sides are merged recursively. In every other case
/// `incoming` replaces `base` outright, whatever the shapes involved.
/// Neither input is modified.
///
/// ```
/// # use dapsql::{merge::merge, value::Value};
/// let base: Value = [("a", 1), ("b", 2)].into_iter().collect();
/// let incoming: Value = [("a", 10), ("c", 3)].into_iter().collect();
/// let expected: Value = [("a", 10), ("b", 2), ("c", 3)].into_iter().collect();
/// assert_eq!(merge(&base, &incoming), expected);
/// ```
pub fn merge(base: &Value, incoming: &Value) -> Value {
    match (base, incoming) {
        (Value::Mapping(base), Value::Mapping(incoming)) => {
            let mut merged = Mapping::with_capacity(base.len() + incoming.len());
            for (key, value) in base {
                let value = match incoming.get(key) {
                    Some(other) => merge(value, other),
                    None => value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            for (key, value) in incoming {
                if !base.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Mapping(merged)
        }
        (_, incoming) => incoming.clone(),
    }
}
