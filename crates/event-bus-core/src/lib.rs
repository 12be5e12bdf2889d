//! Coordination engine for a multi-session event bus: durable storage
//! for sessions, events, and webhooks; publish/subscribe channel
//! routing; session liveness and deduplication; and signed,
//! retrying asynchronous webhook delivery.
//!
//! The RPC/tool surface, CLI client, and desktop notification dispatch
//! that would normally sit in front of this crate are out of scope —
//! [`engine::EventBus`] is the seam such a layer calls into.

pub mod config;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod model;
pub mod router;
pub mod session_registry;
pub mod store;
pub mod sweeper;
pub mod webhook_dispatcher;

pub use config::EventBusConfig;
pub use engine::EventBus;
pub use error::{EventBusError, EventBusResult};
pub use model::{Event, Session, SessionView, Webhook};
