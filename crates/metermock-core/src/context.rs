//! Request context carried alongside recordings.
//!
//! The meter never looks inside a `Context`; it only stores it with the
//! batch so a harness can check which context a recording came from.

use std::sync::Arc;

use crate::label::{KeyValue, Value};

#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: Arc<Vec<KeyValue>>,
}

impl Context {
    /// The empty context used for asynchronous collection.
    pub fn background() -> Self {
        Self::default()
    }

    /// New context with one extra entry; later entries shadow earlier ones.
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.push(KeyValue::new(key, value));
        Self { entries: Arc::new(entries) }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|kv| kv.key == key)
            .map(|kv| &kv.value)
    }

    pub fn is_background(&self) -> bool {
        self.entries.is_empty()
    }
}
