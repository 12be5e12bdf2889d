//! `EventBus`: the facade an embedding RPC/tool layer calls into.
//!
//! Wires together the Store, Router, SessionRegistry, EventLog,
//! WebhookDispatcher, and Sweeper, and exposes the tool-surface
//! operations as typed methods returning typed result records instead
//! of loosely-shaped maps.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::EventBusConfig;
use crate::error::{EventBusError, ValidationError};
use crate::event_log::EventLog;
use crate::model::{Event, SessionView, Webhook};
use crate::session_registry::SessionRegistry;
use crate::store::Store;
use crate::sweeper::Sweeper;
use crate::webhook_dispatcher::WebhookDispatcher;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterSessionResult {
    pub session_id: String,
    pub name: String,
    pub repo: String,
    pub machine: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnregisterSessionResult {
    pub success: bool,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartbeatResult {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishEventResult {
    pub event_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterWebhookResult {
    pub webhook_id: u64,
    pub url: String,
    pub channel: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Tool-surface shape for `list_webhooks` — secrets are represented
/// only as `has_secret`, never echoed back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookSummary {
    pub id: u64,
    pub url: String,
    pub channel: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub active: bool,
    pub has_secret: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Webhook> for WebhookSummary {
    fn from(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id,
            url: webhook.url.clone(),
            channel: webhook.channel_filter.clone(),
            event_types: webhook.event_types.clone(),
            active: webhook.active,
            has_secret: webhook.secret.is_some(),
            created_at: webhook.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnregisterWebhookResult {
    pub success: bool,
    pub webhook_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetWebhookActiveResult {
    pub success: bool,
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(url.to_string()))
    }
}

/// The coordination engine: construct one per process, call `start()`
/// once to begin the background sweep, and route tool-surface calls to
/// its methods.
pub struct EventBus {
    store: Store,
    events: EventLog,
    session_registry: SessionRegistry,
    sweep_interval: Duration,
    session_timeout: Duration,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Result<Self, EventBusError> {
        let store = Store::open(&config.db_path)?;
        let client = Client::new();
        let dispatcher = WebhookDispatcher::new(
            store.clone(),
            client,
            config.webhook_timeout,
            config.webhook_max_attempts,
        );
        let events = EventLog::new(store.clone(), dispatcher, config.max_events);
        let session_registry = SessionRegistry::new(store.clone(), events.clone());
        Ok(Self {
            store,
            events,
            session_registry,
            sweep_interval: config.sweep_interval,
            session_timeout: config.session_timeout,
            sweeper_handle: Mutex::new(None),
        })
    }

    /// Start the background stale-session sweeper. Safe to call more
    /// than once; later calls are no-ops while a sweeper is running.
    pub fn start(&self) {
        let mut handle = self.sweeper_handle.lock().expect("sweeper handle lock poisoned");
        if handle.is_some() {
            return;
        }
        let sweeper = Sweeper::new(
            self.store.clone(),
            self.events.clone(),
            self.sweep_interval,
            self.session_timeout,
        );
        *handle = Some(sweeper.spawn());
    }

    /// Stop the background sweeper, abandoning any in-flight work.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper_handle.lock().expect("sweeper handle lock poisoned").take() {
            handle.abort();
        }
    }

    pub fn register_session(
        &self,
        name: Option<String>,
        cwd: String,
        pid: Option<u32>,
    ) -> Result<RegisterSessionResult, EventBusError> {
        let session = self.session_registry.register(name, cwd, pid)?;
        Ok(RegisterSessionResult {
            session_id: session.id,
            name: session.name,
            repo: session.repo,
            machine: session.machine,
        })
    }

    pub fn unregister_session(
        &self,
        session_id: &str,
    ) -> Result<UnregisterSessionResult, EventBusError> {
        let success = self.session_registry.unregister(session_id)?;
        Ok(UnregisterSessionResult { success, session_id: session_id.to_string() })
    }

    pub fn heartbeat(&self, session_id: &str) -> Result<HeartbeatResult, EventBusError> {
        let success = self.session_registry.heartbeat(session_id)?;
        Ok(HeartbeatResult { success })
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionView>, EventBusError> {
        Ok(self.session_registry.list()?)
    }

    pub fn publish_event(
        &self,
        event_type: impl Into<String>,
        payload: impl Into<String>,
        session_id: Option<String>,
        channel: Option<String>,
    ) -> Result<PublishEventResult, EventBusError> {
        let event = self.events.publish(event_type, payload, session_id, channel)?;
        Ok(PublishEventResult { event_id: event.id })
    }

    pub fn get_events(
        &self,
        since_id: u64,
        session_id: Option<&str>,
        channels: Option<Vec<String>>,
        limit: Option<usize>,
    ) -> Result<Vec<Event>, EventBusError> {
        Ok(self.events.get_events(since_id, session_id, channels, limit)?)
    }

    pub fn register_webhook(
        &self,
        url: impl Into<String>,
        channel: Option<String>,
        event_types: Option<Vec<String>>,
        secret: Option<String>,
    ) -> Result<RegisterWebhookResult, EventBusError> {
        let url = url.into();
        validate_url(&url)?;
        let webhook = self.store.add_webhook(url, channel, event_types, secret)?;
        Ok(RegisterWebhookResult {
            webhook_id: webhook.id,
            url: webhook.url,
            channel: webhook.channel_filter,
            event_types: webhook.event_types,
            created_at: webhook.created_at,
        })
    }

    pub fn list_webhooks(&self, active_only: bool) -> Result<Vec<WebhookSummary>, EventBusError> {
        let webhooks = self.store.list_webhooks(active_only)?;
        Ok(webhooks.iter().map(WebhookSummary::from).collect())
    }

    pub fn unregister_webhook(
        &self,
        webhook_id: u64,
    ) -> Result<UnregisterWebhookResult, EventBusError> {
        let success = self.store.delete_webhook(webhook_id)?;
        Ok(UnregisterWebhookResult { success, webhook_id })
    }

    pub fn set_webhook_active(
        &self,
        webhook_id: u64,
        active: bool,
    ) -> Result<SetWebhookActiveResult, EventBusError> {
        let success = self.store.set_webhook_active(webhook_id, active)?;
        Ok(SetWebhookActiveResult { success })
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
