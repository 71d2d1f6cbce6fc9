//! Per-query "seen" tracking for edges and paths.
//!
//! Records are keyed by query identifier (`pk`). A record is created on the
//! first mark and never on a read; a missing record means nothing was seen.
//! Reads and toggles only touch the in-memory map. Persistence is debounced
//! through [`FlushScheduler`] and happens on [`SeenStatusStore::poll`],
//! [`SeenStatusStore::flush_now`] or drop.
//!
//! Every effective mutation replaces the record's `Arc`, so callers holding a
//! previous [`SeenStatusStore::record`] can detect changes with `Arc::ptr_eq`.

pub mod debounce;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{Storage, StoreResult};

pub use debounce::{DEFAULT_FLUSH_DELAY, FlushScheduler};

/// Default storage key prefix for seen-status documents.
pub const DEFAULT_STORAGE_KEY: &str = "seen_status";

/// Seen edges and paths of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenRecord {
    #[serde(default)]
    pub seen_edges: BTreeSet<String>,
    #[serde(default)]
    pub seen_paths: BTreeSet<String>,
}

/// In-memory seen-status map with debounced write-behind persistence.
pub struct SeenStatusStore<S: Storage> {
    storage: S,
    prefix: String,
    records: HashMap<String, Arc<SeenRecord>>,
    dirty: BTreeSet<String>,
    scheduler: FlushScheduler,
}

impl<S: Storage> SeenStatusStore<S> {
    /// Load every record stored under `storage_key` and take ownership of the
    /// backend.
    pub fn open(storage: S, storage_key: &str, flush_delay: Duration) -> StoreResult<Self> {
        let prefix = format!("{storage_key}/");
        let mut records = HashMap::new();
        for (key, value) in storage.scan_prefix(&prefix)? {
            let pk = key[prefix.len()..].to_string();
            match serde_json::from_value::<SeenRecord>(value) {
                Ok(record) => {
                    records.insert(pk, Arc::new(record));
                }
                Err(e) => {
                    tracing::warn!(pk = %pk, error = %e, "ignoring unreadable seen-status record");
                }
            }
        }
        tracing::debug!(records = records.len(), "loaded seen-status records");
        Ok(Self {
            storage,
            prefix,
            records,
            dirty: BTreeSet::new(),
            scheduler: FlushScheduler::new(flush_delay),
        })
    }

    /// Open with the default key and quiet window.
    pub fn with_defaults(storage: S) -> StoreResult<Self> {
        Self::open(storage, DEFAULT_STORAGE_KEY, DEFAULT_FLUSH_DELAY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current record of a query, if anything was ever marked.
    pub fn record(&self, pk: &str) -> Option<Arc<SeenRecord>> {
        self.records.get(pk).cloned()
    }

    pub fn mark_edge_seen(&mut self, pk: &str, edge_id: &str) -> bool {
        self.update(pk, |r| r.seen_edges.insert(edge_id.to_string()))
    }

    pub fn mark_edge_unseen(&mut self, pk: &str, edge_id: &str) -> bool {
        self.update(pk, |r| r.seen_edges.remove(edge_id))
    }

    pub fn mark_path_seen(&mut self, pk: &str, path_id: &str) -> bool {
        self.update(pk, |r| r.seen_paths.insert(path_id.to_string()))
    }

    pub fn mark_path_unseen(&mut self, pk: &str, path_id: &str) -> bool {
        self.update(pk, |r| r.seen_paths.remove(path_id))
    }

    /// Flip an edge's seen state. Returns the new state.
    pub fn toggle_edge_seen(&mut self, pk: &str, edge_id: &str) -> bool {
        if self.is_edge_seen(pk, edge_id) {
            self.mark_edge_unseen(pk, edge_id);
            false
        } else {
            self.mark_edge_seen(pk, edge_id);
            true
        }
    }

    /// Flip an explicit path mark. Returns the new state.
    pub fn toggle_path_seen(&mut self, pk: &str, path_id: &str) -> bool {
        if self.is_path_marked_seen(pk, path_id) {
            self.mark_path_unseen(pk, path_id);
            false
        } else {
            self.mark_path_seen(pk, path_id);
            true
        }
    }

    pub fn is_edge_seen(&self, pk: &str, edge_id: &str) -> bool {
        self.records
            .get(pk)
            .is_some_and(|r| r.seen_edges.contains(edge_id))
    }

    /// A path is seen when every one of its edges is seen.
    ///
    /// An empty edge list is vacuously seen.
    pub fn is_path_seen<E: AsRef<str>>(&self, pk: &str, edge_ids: &[E]) -> bool {
        edge_ids.iter().all(|e| self.is_edge_seen(pk, e.as_ref()))
    }

    /// Whether the path id itself was marked.
    pub fn is_path_marked_seen(&self, pk: &str, path_id: &str) -> bool {
        self.records
            .get(pk)
            .is_some_and(|r| r.seen_paths.contains(path_id))
    }

    pub fn seen_edge_count(&self, pk: &str) -> usize {
        self.records.get(pk).map_or(0, |r| r.seen_edges.len())
    }

    /// Drop a query's record entirely, e.g. when its ids went stale.
    pub fn reset_seen_status(&mut self, pk: &str) -> bool {
        if self.records.remove(pk).is_none() {
            return false;
        }
        self.touch(pk);
        true
    }

    /// Flush pending writes if the quiet window has elapsed.
    pub fn poll(&mut self) -> StoreResult<bool> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> StoreResult<bool> {
        if !self.scheduler.is_due(now) {
            return Ok(false);
        }
        self.flush_now()?;
        Ok(true)
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Write every touched record now. Failed keys stay pending.
    pub fn flush_now(&mut self) -> StoreResult<()> {
        self.scheduler.clear();
        let pending = std::mem::take(&mut self.dirty);
        let mut first_error: Option<StoreError> = None;

        for pk in pending {
            let key = format!("{}{pk}", self.prefix);
            let result = match self.records.get(&pk) {
                Some(record) => serde_json::to_value(record.as_ref())
                    .map_err(|e| StoreError::Serialization {
                        message: format!("failed to encode seen record {pk}: {e}"),
                    })
                    .and_then(|value| self.storage.set(&key, &value)),
                None => self.storage.remove(&key).map(|_| ()),
            };
            if let Err(e) = result {
                tracing::warn!(pk = %pk, error = %e, "seen-status flush failed");
                self.dirty.insert(pk);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                self.scheduler.schedule_at(Instant::now());
                Err(e)
            }
            None => {
                tracing::debug!("seen-status flushed");
                Ok(())
            }
        }
    }

    fn update(&mut self, pk: &str, apply: impl FnOnce(&mut SeenRecord) -> bool) -> bool {
        let mut next = self
            .records
            .get(pk)
            .map(|r| SeenRecord::clone(r))
            .unwrap_or_default();
        if !apply(&mut next) {
            return false;
        }
        self.records.insert(pk.to_string(), Arc::new(next));
        self.touch(pk);
        true
    }

    fn touch(&mut self, pk: &str) {
        self.dirty.insert(pk.to_string());
        self.scheduler.schedule_at(Instant::now());
    }
}

impl<S: Storage> Drop for SeenStatusStore<S> {
    fn drop(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        if let Err(e) = self.flush_now() {
            tracing::warn!(error = %e, "dropping seen-status store with unflushed writes");
        }
    }
}

impl<S: Storage> std::fmt::Debug for SeenStatusStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenStatusStore")
            .field("prefix", &self.prefix)
            .field("records", &self.records.len())
            .field("dirty", &self.dirty.len())
            .finish()
    }
}
