//! Session persistence operations.

use chrono::Utc;
use redb::ReadableTable;
use tracing::debug;

use super::{Store, SESSIONS_TABLE};
use crate::error::StorageError;
use crate::model::Session;

/// Default staleness window applied by [`Store::cleanup_stale`] when
/// the caller does not override it. Matches `spec.md` §4.1/§6.
const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 600;

impl Store {
    /// Upsert a session, keyed by its `id`.
    pub fn add_session(&self, session: Session) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&session)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            table.insert(session.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        debug!(session_id = %session.id, "session upserted");
        Ok(())
    }

    /// Fetch a session by id.
    pub fn get_session(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a session, returning whether one was actually removed.
    pub fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// List all sessions in unspecified order.
    pub fn list_sessions(&self) -> Result<Vec<Session>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        let mut sessions = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            sessions.push(serde_json::from_slice(value.value())?);
        }
        Ok(sessions)
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> Result<u64, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        Ok(table.len()?)
    }

    /// Exact `(machine, cwd, pid)` lookup. A `pid` of `None` never
    /// matches — dedup only applies when a pid is actually known.
    pub fn find_session_by_key(
        &self,
        machine: &str,
        cwd: &str,
        pid: Option<u32>,
    ) -> Result<Option<Session>, StorageError> {
        let Some(pid) = pid else {
            return Ok(None);
        };
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        for entry in table.iter()? {
            let (_, value) = entry?;
            let session: Session = serde_json::from_slice(value.value())?;
            if session.machine == machine && session.cwd == cwd && session.pid == Some(pid) {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    /// Set `last_heartbeat := max(prev, t)`. Returns `false` if the
    /// session does not exist.
    pub fn update_heartbeat(
        &self,
        id: &str,
        t: chrono::DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            match table.get(id)?.map(|v| v.value().to_vec()) {
                Some(bytes) => {
                    let mut session: Session = serde_json::from_slice(&bytes)?;
                    session.last_heartbeat = session.last_heartbeat.max(t);
                    let new_bytes = serde_json::to_vec(&session)?;
                    table.insert(id, new_bytes.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Remove every session whose heartbeat is older than `timeout_seconds`
    /// (default [`DEFAULT_SESSION_TIMEOUT_SECS`]), returning the removed
    /// sessions so the caller can emit lifecycle events.
    pub fn cleanup_stale(
        &self,
        timeout_seconds: Option<i64>,
    ) -> Result<Vec<Session>, StorageError> {
        let timeout = timeout_seconds.unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS);
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            let mut stale_ids = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let session: Session = serde_json::from_slice(value.value())?;
                if (now - session.last_heartbeat).num_seconds() > timeout {
                    stale_ids.push(key.value().to_string());
                }
            }
            let mut removed = Vec::with_capacity(stale_ids.len());
            for id in stale_ids {
                if let Some(bytes) = table.remove(id.as_str())? {
                    removed.push(serde_json::from_slice(bytes.value())?);
                }
            }
            removed
        };
        write_txn.commit()?;
        if !removed.is_empty() {
            debug!(count = removed.len(), "swept stale sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
