//! Durable persistence for sessions, events, and webhooks.
//!
//! Backed by `redb`, an embedded, single-file, ACID key-value store.
//! Every entity is stored as a `serde_json`-encoded blob under a typed
//! table; a fourth `meta` table holds the id counters so that
//! "assign next id, persist" is one `redb` write transaction — the
//! atomicity `spec.md` §4.1 requires for `add_event` and `add_webhook`.
//!
//! Schema evolution is handled structurally: new fields on `Session`/
//! `Event` carry `#[serde(default)]`, so opening a store written by an
//! older version of this crate backfills safe defaults on read without
//! a migration pass over existing rows.

mod events;
mod sessions;
mod webhooks;

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use tracing::info;

use crate::error::StorageError;

pub(crate) const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
pub(crate) const EVENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("events");
pub(crate) const WEBHOOKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("webhooks");
pub(crate) const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub(crate) const NEXT_EVENT_ID_KEY: &str = "next_event_id";
pub(crate) const NEXT_WEBHOOK_ID_KEY: &str = "next_webhook_id";

/// Durable store for the event bus's three entity kinds.
///
/// Cloning a `Store` is cheap (it wraps an `Arc<Database>`); `redb`
/// serializes writers internally so callers never need an external
/// lock around store operations, matching §5's "store serializes
/// writes internally".
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (creating if absent) the database at `path`, creating the
    /// parent directory if needed and ensuring all tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;
        Self::ensure_schema(&db)?;
        info!(path = %path.display(), "opened event bus store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a store that lives entirely in-process for the duration of
    /// the returned value's lifetime — used by tests so each test gets
    /// an isolated database without touching the filesystem cache.
    #[cfg(test)]
    pub(crate) fn open_temp() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("event-bus.redb");
        let store = Self::open(path).expect("open temp store");
        (store, dir)
    }

    fn ensure_schema(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(SESSIONS_TABLE)?;
            write_txn.open_table(EVENTS_TABLE)?;
            write_txn.open_table(WEBHOOKS_TABLE)?;
            write_txn.open_table(META_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("test.redb");
        let store = Store::open(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(store.session_count().unwrap(), 0);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = Store::open(&path).unwrap();
            store.add_webhook("https://example.com".into(), None, None, None).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_webhooks(false).unwrap().len(), 1);
    }
}
