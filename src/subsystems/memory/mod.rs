//! Memory subsystem: the status log and the stores behind it.
//!
//! [`StatusLog`] is the only thing handlers touch.  It wraps one
//! [`StatusStore`] chosen at startup by the dependency probe: a real
//! database when one answered, [`NoopStatusStore`] otherwise.  Either way
//! `insert` hands back a complete record and `list_all` hands back a vector;
//! store failures are logged here and never reach the caller.

pub mod store;
pub mod stores;

use std::sync::Arc;

use tracing::{debug, warn};

pub use store::{StatusRecord, StatusStore, StoreError};
pub use stores::noop::NoopStatusStore;

/// Persistence facade over a [`StatusStore`].
///
/// Clone freely: the store is behind an `Arc`.
#[derive(Clone)]
pub struct StatusLog {
    store: Arc<dyn StatusStore>,
}

impl StatusLog {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// A log that accepts everything and keeps nothing.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopStatusStore))
    }

    /// Type name of the backing store (`"sqlite"`, `"noop"`, …).
    pub fn store_type(&self) -> &str {
        self.store.store_type()
    }

    /// Create a record for `client_name` and try to persist it.
    ///
    /// Always returns the materialized record.  Whether it was actually
    /// stored is not visible from the return value; consult the startup
    /// availability flags for that.
    pub async fn insert(&self, client_name: &str) -> StatusRecord {
        let record = StatusRecord::new(client_name);
        let store = self.store.clone();
        let to_store = record.clone();

        let outcome = tokio::task::spawn_blocking(move || store.insert(&to_store))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))
            .and_then(|r| r);

        match outcome {
            Ok(()) => debug!(id = %record.id, store = %self.store_type(), "status check recorded"),
            Err(e) => warn!(
                id = %record.id,
                store = %self.store_type(),
                error = %e,
                "status check not persisted; returning unsaved record"
            ),
        }
        record
    }

    /// Up to `limit` stored records.
    ///
    /// Ordering is not guaranteed; the current SQLite backend happens to
    /// return insertion order but callers must not depend on it.  Any store
    /// failure yields an empty vector for this call only.
    pub async fn list_all(&self, limit: usize) -> Vec<StatusRecord> {
        let store = self.store.clone();

        let outcome = tokio::task::spawn_blocking(move || store.list(limit))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))
            .and_then(|r| r);

        match outcome {
            Ok(records) => {
                debug!(count = records.len(), store = %self.store_type(), "status checks listed");
                records
            }
            Err(e) => {
                warn!(store = %self.store_type(), error = %e, "status list failed; returning empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that fails every call: stands in for a transient fault.
    struct FailingStore {
        calls: AtomicUsize,
    }

    impl StatusStore for FailingStore {
        fn store_type(&self) -> &str {
            "failing"
        }
        fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn insert(&self, _record: &StatusRecord) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Query("connection reset".into()))
        }
        fn list(&self, _limit: usize) -> Result<Vec<StatusRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Query("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn noop_insert_still_returns_record() {
        let log = StatusLog::noop();
        let rec = log.insert("alice").await;
        assert_eq!(rec.client_name, "alice");
        assert!(!rec.id.is_empty());
        assert!(log.list_all(1000).await.is_empty());
    }

    #[tokio::test]
    async fn failing_store_degrades_per_call() {
        let failing = Arc::new(FailingStore { calls: AtomicUsize::new(0) });
        let log = StatusLog::new(failing.clone());

        let rec = log.insert("bob").await;
        assert_eq!(rec.client_name, "bob");
        assert!(log.list_all(10).await.is_empty());

        // Every call still reaches the store; one failure does not switch it off.
        log.insert("carol").await;
        assert_eq!(failing.calls.load(Ordering::SeqCst), 3);
        assert_eq!(log.store_type(), "failing");
    }

    #[cfg(feature = "store-sqlite")]
    #[tokio::test]
    async fn sqlite_insert_visible_in_list() {
        let store = stores::sqlite::SqliteStatusStore::open_in_memory().unwrap();
        let log = StatusLog::new(Arc::new(store));

        let a = log.insert("alice").await;
        let b = log.insert("alice").await;
        assert_ne!(a.id, b.id);

        let all = log.list_all(1000).await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.id == a.id && r.client_name == "alice"));
        assert!(all.iter().any(|r| r.id == b.id));
    }

    #[cfg(feature = "store-sqlite")]
    #[tokio::test]
    async fn concurrent_inserts_all_land() {
        let store = stores::sqlite::SqliteStatusStore::open_in_memory().unwrap();
        let log = StatusLog::new(Arc::new(store));

        let mut handles = Vec::new();
        for i in 0..16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move { log.insert(&format!("c{i}")).await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(log.list_all(1000).await.len(), 16);
    }
}
