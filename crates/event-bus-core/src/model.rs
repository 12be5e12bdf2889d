//! Domain types: `Session`, `Event`, `Webhook`, and the request/view
//! shapes built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default broadcast channel every session and webhook can address.
pub const DEFAULT_CHANNEL: &str = "all";

/// A registered agent process.
///
/// Uniqueness is enforced by `(machine, cwd, pid)` when `pid` is
/// present — see `crate::session_registry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub machine: String,
    pub cwd: String,
    pub repo: String,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default)]
    pub pid: Option<u32>,
}

/// An enriched session view returned by `list_sessions`, carrying
/// derived liveness/age fields that are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub name: String,
    pub machine: String,
    pub repo: String,
    pub cwd: String,
    pub pid: Option<u32>,
    pub age_seconds: i64,
    pub idle_seconds: i64,
    pub alive: bool,
}

/// An immutable, numbered event.
///
/// `session_id` is `None` for system-emitted events (`session_registered`,
/// `session_expired`), serialized on the wire as the literal string
/// `"system"` by `crate::webhook_dispatcher::WebhookPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event_type: String,
    pub payload: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

/// An outbound webhook subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: u64,
    pub url: String,
    pub channel_filter: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
