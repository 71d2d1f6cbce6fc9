//! Key-value persistence for seen-status records.
//!
//! Two backends implement [`Storage`]:
//!
//! - [`MemStore`]: in-process data in a concurrent hashmap (DashMap)
//! - [`DurableStore`]: ACID transactions on disk (redb)
//!
//! Values are JSON documents. The seen-status store only ever reads at open
//! time; afterwards the backend is written to in the background.

pub mod durable;
pub mod mem;

use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;

pub use durable::DurableStore;
pub use mem::MemStore;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The persistence collaborator: a string-keyed JSON store.
pub trait Storage: Send + Sync {
    /// Read a value. `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &Value) -> StoreResult<()>;

    /// Delete a key. Returns whether it existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// All `(key, value)` pairs whose key starts with `prefix`. Entries that
    /// cannot be decoded are skipped with a warning.
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        (**self).scan_prefix(prefix)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        (**self).scan_prefix(prefix)
    }
}
