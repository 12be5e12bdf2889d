//! Background task that expires stale sessions on a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::event_log::EventLog;
use crate::store::Store;

/// Periodically removes sessions whose heartbeat has gone stale and
/// publishes a `session_expired` event for each one removed.
pub struct Sweeper {
    store: Store,
    events: EventLog,
    interval: Duration,
    session_timeout: Duration,
}

impl Sweeper {
    pub fn new(store: Store, events: EventLog, interval: Duration, session_timeout: Duration) -> Self {
        Self { store, events, interval, session_timeout }
    }

    /// Spawn the sweep loop. Dropping/aborting the returned handle
    /// stops it; any error sweeping a single pass is logged and the
    /// loop continues rather than terminating the process.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.sweep_once();
            }
        })
    }

    fn sweep_once(&self) {
        match self.store.cleanup_stale(Some(self.session_timeout.as_secs() as i64)) {
            Ok(expired) => {
                for session in expired {
                    info!(session_id = %session.id, "session expired by stale sweep");
                    let payload = serde_json::json!({
                        "session_id": session.id,
                        "name": session.name,
                        "repo": session.repo,
                        "machine": session.machine,
                    })
                    .to_string();
                    if let Err(err) =
                        self.events
                            .publish("session_expired", payload, None, Some("all".into()))
                    {
                        warn!(session_id = %session.id, error = %err, "failed to publish session_expired event");
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "stale sweep failed, continuing");
            }
        }
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
