//! Event persistence: append-only log with id assignment, ring-buffer
//! retention, and id/channel-filtered reads.

use chrono::Utc;
use redb::ReadableTable;
use tracing::debug;

use super::{Store, EVENTS_TABLE, META_TABLE, NEXT_EVENT_ID_KEY};
use crate::error::StorageError;
use crate::model::{Event, DEFAULT_CHANNEL};

impl Store {
    /// Append an event, assigning the next monotonic id, then trim the
    /// log so at most `max_events` rows remain. Assignment, persist,
    /// and trim happen in a single write transaction.
    pub fn add_event(
        &self,
        event_type: impl Into<String>,
        payload: impl Into<String>,
        session_id: Option<String>,
        channel: Option<String>,
        max_events: u64,
    ) -> Result<Event, StorageError> {
        let write_txn = self.db.begin_write()?;
        let event = {
            let mut events_table = write_txn.open_table(EVENTS_TABLE)?;
            let mut meta_table = write_txn.open_table(META_TABLE)?;

            let next_id = meta_table
                .get(NEXT_EVENT_ID_KEY)?
                .map(|v| v.value())
                .unwrap_or(1);

            let event = Event {
                id: next_id,
                event_type: event_type.into(),
                payload: payload.into(),
                session_id,
                timestamp: Utc::now(),
                channel: channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            };

            let bytes = serde_json::to_vec(&event)?;
            events_table.insert(event.id, bytes.as_slice())?;
            meta_table.insert(NEXT_EVENT_ID_KEY, next_id + 1)?;

            if max_events > 0 && event.id > max_events {
                let threshold = event.id - max_events;
                let stale_ids: Vec<u64> = events_table
                    .iter()?
                    .map(|entry| entry.map(|(k, _)| k.value()))
                    .collect::<Result<_, _>>()?;
                for id in stale_ids.into_iter().filter(|id| *id <= threshold) {
                    events_table.remove(id)?;
                }
            }

            event
        };
        write_txn.commit()?;
        debug!(event_id = event.id, channel = %event.channel, "event appended");
        Ok(event)
    }

    /// Events with `id > since_id`, optionally restricted to
    /// `channels`, ascending by id, truncated to `limit`.
    pub fn get_events(
        &self,
        since_id: u64,
        limit: Option<usize>,
        channels: Option<&[String]>,
    ) -> Result<Vec<Event>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        let mut events = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            if key.value() <= since_id {
                continue;
            }
            let event: Event = serde_json::from_slice(value.value())?;
            if let Some(channels) = channels {
                if !channels.iter().any(|c| c == &event.channel) {
                    continue;
                }
            }
            events.push(event);
            if let Some(limit) = limit {
                if events.len() >= limit {
                    break;
                }
            }
        }
        Ok(events)
    }

    /// The highest assigned event id, or 0 if no events exist yet.
    pub fn get_last_event_id(&self) -> Result<u64, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;
        let next_id = table.get(NEXT_EVENT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
        Ok(next_id.saturating_sub(1))
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
