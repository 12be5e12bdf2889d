//! Publish/query façade over the event store: validates input, assigns
//! ids via the store, and hands published events to the dispatcher
//! without waiting on delivery.

use tracing::debug;

use crate::error::{EventBusError, StorageError, ValidationError};
use crate::model::Event;
use crate::store::Store;
use crate::webhook_dispatcher::WebhookDispatcher;

/// Publishes events durably and serves id/channel-filtered reads.
#[derive(Clone)]
pub struct EventLog {
    store: Store,
    dispatcher: WebhookDispatcher,
    max_events: u64,
}

impl EventLog {
    pub fn new(store: Store, dispatcher: WebhookDispatcher, max_events: u64) -> Self {
        Self { store, dispatcher, max_events }
    }

    /// Validate, persist, and schedule dispatch for a new event. Returns
    /// as soon as the event is durable; dispatch proceeds concurrently.
    pub fn publish(
        &self,
        event_type: impl Into<String>,
        payload: impl Into<String>,
        session_id: Option<String>,
        channel: Option<String>,
    ) -> Result<Event, EventBusError> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(ValidationError::EmptyEventType.into());
        }

        let event = self
            .store
            .add_event(event_type, payload, session_id, channel, self.max_events)
            .map_err(EventBusError::from)?;

        debug!(event_id = event.id, channel = %event.channel, "publishing event");
        self.dispatcher.dispatch(event.clone());
        Ok(event)
    }

    /// Read events after `since_id`. When `session_id` is given and
    /// `channels` is not, the read is restricted to the default set of
    /// channels a session cares about: `all`, its own `session:<id>`,
    /// `repo:<repo>`, and `machine:<machine>`.
    pub fn get_events(
        &self,
        since_id: u64,
        session_id: Option<&str>,
        channels: Option<Vec<String>>,
        limit: Option<usize>,
    ) -> Result<Vec<Event>, StorageError> {
        let effective_channels = match (channels, session_id) {
            (Some(channels), _) => Some(channels),
            (None, Some(session_id)) => self.default_channels_for_session(session_id)?,
            (None, None) => None,
        };
        self.store.get_events(since_id, limit, effective_channels.as_deref())
    }

    fn default_channels_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Vec<String>>, StorageError> {
        let mut channels = vec!["all".to_string(), format!("session:{session_id}")];
        if let Some(session) = self.store.get_session(session_id)? {
            channels.push(format!("repo:{}", session.repo));
            channels.push(format!("machine:{}", session.machine));
        }
        Ok(Some(channels))
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
