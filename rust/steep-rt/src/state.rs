//! Persistent state capability behind compiled `@state` accessors.

use crate::values::Value;
use std::collections::HashMap;

/// What compiled accessors call: `getState(key, default)` and
/// `setState(key, value)`.
pub trait StateStore {
    /// Stored value for `key`, or `default` when nothing was written yet.
    fn get_state(&self, key: &str, default: Value) -> Value;
    fn set_state(&mut self, key: &str, value: Value);
}

/// In-memory store, used by hosts without persistence and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Written keys and values as a JSON object, for inspection.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Object(self.entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl StateStore for MemoryStore {
    fn get_state(&self, key: &str, default: Value) -> Value {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    fn set_state(&mut self, key: &str, value: Value) {
        tracing::debug!(key, "set state");
        self.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_until_written() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_state("count", Value::from(0)), Value::from(0));
        store.set_state("count", Value::from(3));
        assert_eq!(store.get_state("count", Value::from(0)), Value::from(3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_undefined_is_a_stored_value() {
        let mut store = MemoryStore::new();
        store.set_state("owner", Value::Undefined);
        assert_eq!(store.get_state("owner", Value::from("x")), Value::Undefined);
        assert_eq!(store.snapshot(), serde_json::json!({ "owner": null }));
    }
}
