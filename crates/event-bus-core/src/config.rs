//! Runtime configuration, loaded from environment variables with the
//! defaults from `spec.md` §6. This is the one piece of "configuration"
//! the core owns directly — it is not command-line argument parsing,
//! which stays out of scope.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 600;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;
const DEFAULT_MAX_EVENTS: u64 = 10_000;
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEBHOOK_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DB_PATH: &str = "event-bus.redb";

/// Tunable knobs for the engine. Construct with [`EventBusConfig::from_env`]
/// to pick up environment overrides, or [`EventBusConfig::default`] for a
/// config pointed at an explicit database path.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBusConfig {
    /// How long a session may go without a heartbeat before the sweeper
    /// considers it stale.
    pub session_timeout: Duration,
    /// How often the sweeper runs `cleanup_stale`.
    pub sweep_interval: Duration,
    /// Ring-buffer retention cap on the event log.
    pub max_events: u64,
    /// Per-request timeout for outbound webhook deliveries.
    pub webhook_timeout: Duration,
    /// Total delivery attempts per webhook (1 initial + N-1 retries).
    pub webhook_max_attempts: u32,
    /// Path to the single-file embedded database.
    pub db_path: PathBuf,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_events: DEFAULT_MAX_EVENTS,
            webhook_timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            webhook_max_attempts: DEFAULT_WEBHOOK_MAX_ATTEMPTS,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl EventBusConfig {
    /// Load configuration, applying environment overrides on top of
    /// the spec defaults. Malformed numeric env vars fall back to the
    /// default rather than failing startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_timeout: Duration::from_secs(env_u64(
                "SESSION_TIMEOUT",
                DEFAULT_SESSION_TIMEOUT_SECS,
            )),
            sweep_interval: Duration::from_secs(env_u64(
                "SWEEP_INTERVAL",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            max_events: env_u64("MAX_EVENTS", DEFAULT_MAX_EVENTS),
            webhook_timeout: Duration::from_secs(env_u64(
                "WEBHOOK_TIMEOUT",
                DEFAULT_WEBHOOK_TIMEOUT_SECS,
            )),
            webhook_max_attempts: env_u64("WEBHOOK_MAX_ATTEMPTS", u64::from(DEFAULT_WEBHOOK_MAX_ATTEMPTS))
                as u32,
            db_path: std::env::var("EVENT_BUS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Initializes a `tracing-subscriber` `EnvFilter` subscriber for
/// binaries embedding this engine. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_spec() {
        let cfg = EventBusConfig::default();
        assert_eq!(cfg.session_timeout, Duration::from_secs(600));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(30));
        assert_eq!(cfg.max_events, 10_000);
        assert_eq!(cfg.webhook_timeout, Duration::from_secs(10));
        assert_eq!(cfg.webhook_max_attempts, 3);
    }

    #[test]
    #[serial]
    fn from_env_applies_overrides() {
        std::env::set_var("MAX_EVENTS", "42");
        std::env::set_var("SESSION_TIMEOUT", "not-a-number");
        let cfg = EventBusConfig::from_env();
        assert_eq!(cfg.max_events, 42);
        assert_eq!(cfg.session_timeout, Duration::from_secs(600));
        std::env::remove_var("MAX_EVENTS");
        std::env::remove_var("SESSION_TIMEOUT");
    }
}
