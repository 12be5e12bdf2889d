//! Webhook registration persistence.

use chrono::Utc;
use redb::ReadableTable;
use tracing::debug;

use super::{Store, META_TABLE, NEXT_WEBHOOK_ID_KEY, WEBHOOKS_TABLE};
use crate::error::StorageError;
use crate::model::Webhook;

impl Store {
    /// Register a new webhook, assigning the next monotonic id.
    pub fn add_webhook(
        &self,
        url: impl Into<String>,
        channel_filter: Option<String>,
        event_types: Option<Vec<String>>,
        secret: Option<String>,
    ) -> Result<Webhook, StorageError> {
        let write_txn = self.db.begin_write()?;
        let webhook = {
            let mut webhooks_table = write_txn.open_table(WEBHOOKS_TABLE)?;
            let mut meta_table = write_txn.open_table(META_TABLE)?;

            let next_id = meta_table
                .get(NEXT_WEBHOOK_ID_KEY)?
                .map(|v| v.value())
                .unwrap_or(1);

            let webhook = Webhook {
                id: next_id,
                url: url.into(),
                channel_filter,
                event_types,
                secret,
                active: true,
                created_at: Utc::now(),
            };

            let bytes = serde_json::to_vec(&webhook)?;
            webhooks_table.insert(webhook.id, bytes.as_slice())?;
            meta_table.insert(NEXT_WEBHOOK_ID_KEY, next_id + 1)?;
            webhook
        };
        write_txn.commit()?;
        debug!(webhook_id = webhook.id, url = %webhook.url, "webhook registered");
        Ok(webhook)
    }

    /// Fetch a webhook by id.
    pub fn get_webhook(&self, id: u64) -> Result<Option<Webhook>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEBHOOKS_TABLE)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// List registered webhooks, optionally restricted to active ones.
    pub fn list_webhooks(&self, active_only: bool) -> Result<Vec<Webhook>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEBHOOKS_TABLE)?;
        let mut webhooks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let webhook: Webhook = serde_json::from_slice(value.value())?;
            if !active_only || webhook.active {
                webhooks.push(webhook);
            }
        }
        Ok(webhooks)
    }

    /// Remove a webhook, returning whether one was actually removed.
    pub fn delete_webhook(&self, id: u64) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(WEBHOOKS_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Flip a webhook's `active` flag. Returns `false` if it does not exist.
    pub fn set_webhook_active(&self, id: u64, active: bool) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(WEBHOOKS_TABLE)?;
            match table.get(id)?.map(|v| v.value().to_vec()) {
                Some(bytes) => {
                    let mut webhook: Webhook = serde_json::from_slice(&bytes)?;
                    webhook.active = active;
                    let new_bytes = serde_json::to_vec(&webhook)?;
                    table.insert(id, new_bytes.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "webhooks_tests.rs"]
mod tests;
