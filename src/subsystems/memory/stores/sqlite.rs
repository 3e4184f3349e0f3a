//! `sqlite` store: durable status log in a single SQLite database.
//!
//! One shared connection guarded by a `Mutex`; the lock is held for a single
//! statement only.  Calls arrive from `spawn_blocking` threads, so a slow
//! disk never stalls the async runtime.
//!
//! ```text
//! {store.url}/
//! └── {store.db_name}.sqlite3
//!     └── status_checks (id TEXT PK, client_name TEXT, timestamp TEXT)
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, params};

use super::super::store::{StatusRecord, StatusStore, StoreError};

/// Schema version stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
}

impl SqliteStatusStore {
    /// Open (or create) the database file at `db_path`.
    ///
    /// The parent directory must already exist; a missing directory is an
    /// open failure, not something this store papers over.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db_path, flags)
            .map_err(|e| StoreError::Open(format!("{}: {e}", db_path.display())))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Open(format!("set journal_mode WAL: {e}")))?;
        Self::from_conn(conn)
    }

    /// Private in-memory database: nothing survives the process.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Open(format!(":memory: {e}")))?;
        Self::from_conn(conn)
    }

    fn from_conn(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::Open(format!("set busy_timeout: {e}")))?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StoreError::Open(format!("read user_version: {e}")))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS status_checks (
            id TEXT PRIMARY KEY,
            client_name TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        PRAGMA user_version = 1;
        ",
    )
    .map_err(|e| StoreError::Open(format!("initialize schema: {e}")))
}

impl StatusStore for SqliteStatusStore {
    fn store_type(&self) -> &str {
        "sqlite"
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM status_checks", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| StoreError::Query(format!("ping: {e}")))
    }

    fn insert(&self, record: &StatusRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO status_checks (id, client_name, timestamp) VALUES (?1, ?2, ?3)",
            params![
                record.id,
                record.client_name,
                record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )
        .map(|_| ())
        .map_err(|e| StoreError::Query(format!("insert status check: {e}")))
    }

    fn list(&self, limit: usize) -> Result<Vec<StatusRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, client_name, timestamp FROM status_checks LIMIT ?1")
            .map_err(|e| StoreError::Query(format!("prepare list: {e}")))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|e| StoreError::Query(format!("list status checks: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, client_name, ts) =
                row.map_err(|e| StoreError::Query(format!("read row: {e}")))?;
            let timestamp = DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| StoreError::Decode(format!("timestamp '{ts}' for {id}: {e}")))?
                .with_timezone(&Utc);
            out.push(StatusRecord { id, client_name, timestamp });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_then_list() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        let rec = StatusRecord::new("alice");
        store.insert(&rec).unwrap();

        let all = store.list(1000).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, rec.id);
        assert_eq!(all[0].client_name, "alice");
        assert_eq!(all[0].timestamp, rec.timestamp);
    }

    #[test]
    fn timestamp_keeps_full_precision() {
        use chrono::TimeZone;

        let store = SqliteStatusStore::open_in_memory().unwrap();
        let mut rec = StatusRecord::new("precise");
        rec.timestamp = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        store.insert(&rec).unwrap();

        let all = store.list(10).unwrap();
        assert_eq!(all[0].timestamp, rec.timestamp);
        assert_eq!(all[0].timestamp.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn list_respects_limit() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.insert(&StatusRecord::new(format!("client-{i}"))).unwrap();
        }
        assert_eq!(store.list(3).unwrap().len(), 3);
        assert_eq!(store.list(0).unwrap().len(), 0);
    }

    #[test]
    fn duplicate_id_is_a_query_error() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        let rec = StatusRecord::new("alice");
        store.insert(&rec).unwrap();
        assert!(matches!(store.insert(&rec), Err(StoreError::Query(_))));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_database.sqlite3");

        let rec = StatusRecord::new("persisted");
        {
            let store = SqliteStatusStore::open(&path).unwrap();
            store.insert(&rec).unwrap();
        }

        let store = SqliteStatusStore::open(&path).unwrap();
        store.ping().unwrap();
        let all = store.list(10).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, rec.id);
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/db.sqlite3");
        assert!(matches!(SqliteStatusStore::open(&path), Err(StoreError::Open(_))));
    }

    #[test]
    fn malformed_timestamp_is_decode_error() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO status_checks (id, client_name, timestamp) VALUES ('x', 'y', 'yesterday')",
                [],
            )
            .unwrap();
        assert!(matches!(store.list(10), Err(StoreError::Decode(_))));
    }
}
