//! Per-session scratch context shared across screen transitions.

use serde_json::{Map, Value};

/// Untyped key/value context carried alongside the current screen.
///
/// Screens stash whatever they need here (a selected plan, a cart, a search
/// query) and later screens read it back. Patches merge key-by-key: a
/// transition that sets `{"plan_id": 3}` leaves an earlier `{"guests": 2}`
/// untouched. The whole context is dropped on return-to-idle, never earlier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    values: Map<String, Value>,
}

impl SessionContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a patch into the context, overwriting colliding keys.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.values.insert(key, value);
        }
    }

    /// Look up one value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether the context holds anything.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}
