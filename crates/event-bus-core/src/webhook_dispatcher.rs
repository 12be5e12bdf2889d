//! Asynchronous, signed delivery of events to matching webhooks.
//!
//! Dispatch is fire-and-forget from the publisher's point of view: one
//! `tokio::spawn` task per matching webhook, bounded in aggregate by a
//! semaphore so a large fan-out can't exhaust the process's sockets.
//! Each task re-checks `active` before every attempt (a webhook can be
//! disabled between enqueue and delivery) and retries transient
//! failures with a fixed, unjittered backoff.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{PermanentDeliveryError, TransientDeliveryError};
use crate::model::{Event, Webhook};
use crate::router::matching_webhooks;
use crate::store::Store;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "X-Event-Bus-Signature";
const MAX_CONCURRENT_DELIVERIES: usize = 64;

/// The JSON body posted to a webhook URL. `session_id` is the literal
/// string `"system"` for system-emitted events (`session_id: None`).
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    id: u64,
    event_type: &'a str,
    payload: &'a str,
    session_id: &'a str,
    timestamp: DateTime<Utc>,
    channel: &'a str,
}

impl<'a> From<&'a Event> for WebhookPayload<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            id: event.id,
            event_type: &event.event_type,
            payload: &event.payload,
            session_id: event.session_id.as_deref().unwrap_or("system"),
            timestamp: event.timestamp,
            channel: &event.channel,
        }
    }
}

/// Dispatches events to webhooks over outbound HTTP POST.
#[derive(Clone)]
pub struct WebhookDispatcher {
    store: Store,
    client: Client,
    timeout: Duration,
    max_attempts: u32,
    permits: Arc<Semaphore>,
}

impl WebhookDispatcher {
    pub fn new(store: Store, client: Client, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            store,
            client,
            timeout,
            max_attempts: max_attempts.max(1),
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_DELIVERIES)),
        }
    }

    /// Schedule delivery of `event` to every currently-active webhook
    /// that matches it. Returns immediately; the returned handles exist
    /// so tests can await completion, production callers drop them.
    pub fn dispatch(&self, event: Event) -> Vec<JoinHandle<()>> {
        let webhooks = match self.store.list_webhooks(true) {
            Ok(webhooks) => webhooks,
            Err(err) => {
                warn!(error = %err, "failed to load webhooks for dispatch");
                return Vec::new();
            }
        };

        matching_webhooks(&webhooks, &event)
            .into_iter()
            .cloned()
            .map(|webhook| {
                let store = self.store.clone();
                let client = self.client.clone();
                let timeout = self.timeout;
                let max_attempts = self.max_attempts;
                let permits = self.permits.clone();
                let event = event.clone();
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    deliver(&client, &store, webhook, &event, timeout, max_attempts).await;
                })
            })
            .collect()
    }
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn deliver(
    client: &Client,
    store: &Store,
    webhook: Webhook,
    event: &Event,
    timeout: Duration,
    max_attempts: u32,
) {
    let body = match serde_json::to_vec(&WebhookPayload::from(event)) {
        Ok(body) => body,
        Err(err) => {
            warn!(webhook_id = webhook.id, error = %err, "failed to encode webhook payload");
            return;
        }
    };
    let signature = webhook.secret.as_deref().map(|secret| sign(secret, &body));

    let mut last_error: Option<TransientDeliveryError> = None;
    for attempt in 0..max_attempts {
        match store.get_webhook(webhook.id) {
            Ok(Some(current)) if !current.active => {
                debug!(webhook_id = webhook.id, "webhook disabled before delivery, aborting");
                return;
            }
            Ok(None) => {
                debug!(webhook_id = webhook.id, "webhook deleted before delivery, aborting");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(webhook_id = webhook.id, error = %err, "failed to re-check webhook state");
            }
        }

        let mut request = client
            .post(&webhook.url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .body(body.clone());
        if let Some(sig) = &signature {
            request = request.header(SIGNATURE_HEADER, format!("sha256={sig}"));
        }

        match request.send().await {
            Ok(response) if response.status().as_u16() < 400 => {
                debug!(webhook_id = webhook.id, attempt, "webhook delivered");
                return;
            }
            Ok(response) => {
                let err = TransientDeliveryError::HttpStatus {
                    webhook_id: webhook.id,
                    status: response.status().as_u16(),
                };
                debug!(webhook_id = webhook.id, attempt, error = %err, "webhook delivery attempt failed");
                last_error = Some(err);
            }
            Err(err) if err.is_timeout() => {
                let err = TransientDeliveryError::Timeout { webhook_id: webhook.id };
                debug!(webhook_id = webhook.id, attempt, error = %err, "webhook delivery attempt failed");
                last_error = Some(err);
            }
            Err(err) => {
                let err = TransientDeliveryError::Request { webhook_id: webhook.id, source: err };
                debug!(webhook_id = webhook.id, attempt, error = %err, "webhook delivery attempt failed");
                last_error = Some(err);
            }
        }

        if attempt + 1 < max_attempts {
            tokio::time::sleep(backoff_for_attempt(attempt)).await;
        }
    }

    let permanent = PermanentDeliveryError {
        webhook_id: webhook.id,
        attempts: max_attempts,
        last_error: last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string()),
    };
    warn!(
        webhook_id = permanent.webhook_id,
        attempts = permanent.attempts,
        last_error = %permanent.last_error,
        "{permanent}"
    );
}

#[cfg(test)]
#[path = "webhook_dispatcher_tests.rs"]
mod tests;
