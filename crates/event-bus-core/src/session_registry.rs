//! Session lifecycle: registration with origin-based dedup, heartbeat,
//! unregistration, and the enriched view returned by `list`.

pub mod liveness;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StorageError;
use crate::event_log::EventLog;
use crate::model::{Session, SessionView};
use crate::store::Store;

/// Derive the short repo identifier from a working directory: the
/// segment preceding `.worktrees` if present, else the last path
/// component, else `"unknown"`.
fn derive_repo(cwd: &str) -> String {
    let segments: Vec<&str> = cwd.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(idx) = segments.iter().position(|s| *s == ".worktrees") {
        if idx > 0 {
            return segments[idx - 1].to_string();
        }
    }
    segments
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Registers, tracks, and expires agent sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Store,
    events: EventLog,
}

impl SessionRegistry {
    pub fn new(store: Store, events: EventLog) -> Self {
        Self { store, events }
    }

    /// Register a session, deriving `machine`/`repo` and deduplicating
    /// by `(machine, cwd, pid)` when a `pid` is supplied.
    pub fn register(
        &self,
        name: Option<String>,
        cwd: String,
        pid: Option<u32>,
    ) -> Result<Session, StorageError> {
        let machine = local_hostname();
        let repo = derive_repo(&cwd);
        let name = name.unwrap_or_else(|| repo.clone());

        if let Some(existing) = self.store.find_session_by_key(&machine, &cwd, pid)? {
            self.store.delete_session(&existing.id)?;
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            name,
            machine,
            cwd,
            repo,
            registered_at: now,
            last_heartbeat: now,
            pid,
        };
        self.store.add_session(session.clone())?;
        info!(session_id = %session.id, repo = %session.repo, "session registered");

        let payload = serde_json::json!({
            "session_id": session.id,
            "name": session.name,
            "repo": session.repo,
            "machine": session.machine,
        })
        .to_string();
        if let Err(err) =
            self.events
                .publish("session_registered", payload, None, Some("all".into()))
        {
            warn!(session_id = %session.id, error = %err, "failed to publish session_registered event");
        }

        Ok(session)
    }

    /// Remove a session. Idempotent: unregistering an unknown id is not
    /// an error, it simply reports `false`.
    pub fn unregister(&self, session_id: &str) -> Result<bool, StorageError> {
        let removed = self.store.delete_session(session_id)?;
        if removed {
            info!(session_id, "session unregistered");
            let payload = serde_json::json!({ "session_id": session_id }).to_string();
            if let Err(err) =
                self.events
                    .publish("session_unregistered", payload, None, Some("all".into()))
            {
                warn!(session_id, error = %err, "failed to publish session_unregistered event");
            }
        }
        Ok(removed)
    }

    /// Bump `last_heartbeat` to `now` (monotonically).
    pub fn heartbeat(&self, session_id: &str) -> Result<bool, StorageError> {
        self.store.update_heartbeat(session_id, Utc::now())
    }

    /// List every session enriched with age/idle durations and a
    /// best-effort liveness probe.
    pub fn list(&self) -> Result<Vec<SessionView>, StorageError> {
        let now = Utc::now();
        let sessions = self.store.list_sessions()?;
        Ok(sessions
            .into_iter()
            .map(|session| SessionView {
                session_id: session.id,
                name: session.name,
                machine: session.machine,
                repo: session.repo,
                cwd: session.cwd,
                pid: session.pid,
                age_seconds: (now - session.registered_at).num_seconds(),
                idle_seconds: (now - session.last_heartbeat).num_seconds(),
                alive: liveness::is_pid_alive(session.pid),
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "session_registry_tests.rs"]
mod tests;
