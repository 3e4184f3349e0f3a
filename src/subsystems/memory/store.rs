//! Store trait: the operations a status-log backend supports.
//!
//! Stores are pluggable: [`SqliteStatusStore`](super::stores::sqlite::SqliteStatusStore)
//! persists to a database file, [`NoopStatusStore`](super::stores::noop::NoopStatusStore)
//! accepts everything and keeps nothing.  All methods are blocking; the
//! [`StatusLog`](super::StatusLog) facade wraps them in `spawn_blocking`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One status-check submission.
///
/// Created by the facade, never mutated afterwards.  `id` is a UUID v4
/// string generated server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub client_name: String,
    /// UTC creation time.
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    /// Materialize a fresh record for `client_name` with a new id and the
    /// current time.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_name: client_name.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Failure inside a store backend.
///
/// Never leaves the memory subsystem: the facade logs it and degrades the
/// call to no-op behaviour.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store open failed: {0}")]
    Open(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("stored row is malformed: {0}")]
    Decode(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("store task failed: {0}")]
    Join(String),
}

/// Pluggable status-log backend.
pub trait StatusStore: Send + Sync {
    /// Short type name for logs (e.g. `"sqlite"`).
    fn store_type(&self) -> &str;

    /// Cheap liveness query; used once by the startup probe.
    fn ping(&self) -> Result<(), StoreError>;

    /// Persist one record.
    fn insert(&self, record: &StatusRecord) -> Result<(), StoreError>;

    /// Return up to `limit` records. Order is backend-defined.
    fn list(&self, limit: usize) -> Result<Vec<StatusRecord>, StoreError>;
}
