//! ACID-durable key-value store backed by redb.
//!
//! Seen-status records survive restarts here. Values are stored as JSON bytes
//! under string keys.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;

use super::{Storage, StoreResult};
use crate::error::StoreError;

/// Table for seen-status documents (string keys → JSON bytes).
const SEEN_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("seen_status");

/// ACID-durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableStore {
    db: Arc<Database>,
}

fn redb_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

impl DurableStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("pathfacet.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Make sure the table exists so read transactions never miss it.
        let txn = db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        txn.open_table(SEEN_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        txn.commit().map_err(|e| redb_err("commit", e))?;

        tracing::info!(path = %db_path.display(), "opened durable seen-status store");
        Ok(Self { db: Arc::new(db) })
    }
}

fn decode(key: &str, bytes: &[u8]) -> StoreResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
        message: format!("failed to decode value for {key}: {e}"),
    })
}

impl Storage for DurableStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(SEEN_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let result = table.get(key).map_err(|e| redb_err("get", e))?;
        result.map(|guard| decode(key, guard.value())).transpose()
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Serialization {
            message: format!("failed to encode value for {key}: {e}"),
        })?;
        let txn = self.db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        {
            let mut table = txn
                .open_table(SEEN_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(|e| redb_err("insert", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        let existed = {
            let mut table = txn
                .open_table(SEEN_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            let result = table.remove(key).map_err(|e| redb_err("remove", e))?;
            result.is_some()
        };
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(existed)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(SEEN_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let mut out = Vec::new();
        for entry in table.range(prefix..).map_err(|e| redb_err("range", e))? {
            let (k, v) = entry.map_err(|e| redb_err("range item", e))?;
            let key = k.value();
            if !key.starts_with(prefix) {
                break;
            }
            match decode(key, v.value()) {
                Ok(value) => out.push((key.to_string(), value)),
                Err(e) => tracing::warn!(key, error = %e, "skipping undecodable entry in prefix scan"),
            }
        }
        Ok(out)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}
