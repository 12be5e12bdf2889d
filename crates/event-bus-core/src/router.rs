//! Channel and event-type matching between webhooks and events.
//!
//! A webhook's `channel_filter` is matched against an event's `channel`
//! three ways: absent means "any channel"; a filter ending in `:` is a
//! namespace prefix match (`"repo:"` matches `"repo:myrepo"`); anything
//! else is exact string equality. `event_types` is a plain allow-list —
//! absent or empty means "any event type".

use crate::model::{Event, Webhook};

/// Whether `channel_filter` admits `channel`.
pub fn channel_matches(channel_filter: Option<&str>, channel: &str) -> bool {
    match channel_filter {
        None => true,
        Some(filter) if filter.ends_with(':') => channel.starts_with(filter),
        Some(filter) => filter == channel,
    }
}

/// Whether `event_types` admits `event_type`.
pub fn event_type_matches(event_types: Option<&[String]>, event_type: &str) -> bool {
    match event_types {
        None => true,
        Some(types) if types.is_empty() => true,
        Some(types) => types.iter().any(|t| t == event_type),
    }
}

/// Whether an active webhook should receive this event.
pub fn webhook_matches(webhook: &Webhook, event: &Event) -> bool {
    webhook.active
        && channel_matches(webhook.channel_filter.as_deref(), &event.channel)
        && event_type_matches(webhook.event_types.as_deref(), &event.event_type)
}

/// Select every active webhook from `webhooks` that should receive `event`.
pub fn matching_webhooks<'a>(webhooks: &'a [Webhook], event: &Event) -> Vec<&'a Webhook> {
    webhooks.iter().filter(|wh| webhook_matches(wh, event)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(channel: &str, event_type: &str) -> Event {
        Event {
            id: 1,
            event_type: event_type.to_string(),
            payload: "{}".to_string(),
            session_id: None,
            timestamp: Utc::now(),
            channel: channel.to_string(),
        }
    }

    fn webhook(channel_filter: Option<&str>, event_types: Option<Vec<&str>>, active: bool) -> Webhook {
        Webhook {
            id: 1,
            url: "https://example.com/hook".to_string(),
            channel_filter: channel_filter.map(String::from),
            event_types: event_types.map(|types| types.into_iter().map(String::from).collect()),
            secret: None,
            active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn absent_filter_matches_any_channel() {
        assert!(channel_matches(None, "all"));
        assert!(channel_matches(None, "repo:myrepo"));
    }

    #[test]
    fn prefix_filter_matches_namespace() {
        assert!(channel_matches(Some("repo:"), "repo:myrepo"));
        assert!(!channel_matches(Some("repo:"), "repository:other"));
        assert!(!channel_matches(Some("repo:"), "all"));
    }

    #[test]
    fn exact_filter_requires_full_match() {
        assert!(channel_matches(Some("all"), "all"));
        assert!(!channel_matches(Some("all"), "alloy"));
    }

    #[test]
    fn absent_or_empty_event_types_match_any() {
        assert!(event_type_matches(None, "anything"));
        assert!(event_type_matches(Some(&[]), "anything"));
    }

    #[test]
    fn event_type_list_is_case_sensitive_allowlist() {
        let types = vec!["build_complete".to_string()];
        assert!(event_type_matches(Some(&types), "build_complete"));
        assert!(!event_type_matches(Some(&types), "Build_Complete"));
        assert!(!event_type_matches(Some(&types), "other"));
    }

    #[test]
    fn inactive_webhook_never_matches() {
        let wh = webhook(None, None, false);
        assert!(!webhook_matches(&wh, &event("all", "anything")));
    }

    #[test]
    fn matching_webhooks_filters_the_full_set() {
        let hooks = vec![
            webhook(Some("repo:"), None, true),
            webhook(Some("session:abc"), None, true),
            webhook(None, Some(vec!["build_complete"]), true),
            webhook(None, None, false),
        ];
        let ev = event("repo:myrepo", "push");
        let matched = matching_webhooks(&hooks, &ev);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].channel_filter.as_deref(), Some("repo:"));
    }
}
