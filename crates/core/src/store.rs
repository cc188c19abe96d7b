//! Durable key-value persistence contract.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::errors::{Error, Result};

/// Synchronous key-value persistence, process-wide, keyed by string.
///
/// Implementations must never surface malformed stored data as an error:
/// an undecodable document is reported absent (with a warning) so callers
/// fall back to their initial value.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store.
///
/// The fallback backend for hosts without durable persistence, and the
/// store double used by unit tests. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>> {
        self.entries
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
