use super::*;

const UNLIMITED: u64 = 10_000;

#[test]
fn add_event_assigns_sequential_ids() {
    let (store, _dir) = Store::open_temp();
    let e1 = store
        .add_event("greeting", "hi", Some("s1".into()), None, UNLIMITED)
        .unwrap();
    let e2 = store
        .add_event("greeting", "hi again", Some("s1".into()), None, UNLIMITED)
        .unwrap();
    assert_eq!(e1.id, 1);
    assert_eq!(e2.id, 2);
}

#[test]
fn add_event_defaults_channel_to_all() {
    let (store, _dir) = Store::open_temp();
    let event = store
        .add_event("test_event", "payload", Some("s1".into()), None, UNLIMITED)
        .unwrap();
    assert_eq!(event.channel, "all");
}

#[test]
fn add_event_honors_explicit_channel() {
    let (store, _dir) = Store::open_temp();
    let event = store
        .add_event(
            "direct_message",
            "hello",
            Some("sender".into()),
            Some("session:receiver".into()),
            UNLIMITED,
        )
        .unwrap();
    assert_eq!(event.channel, "session:receiver");
}

#[test]
fn get_events_since_id_is_exclusive_and_ascending() {
    let (store, _dir) = Store::open_temp();
    let mut ids = Vec::new();
    for i in 0..5 {
        let event = store
            .add_event(format!("event_{i}"), "p", None, None, UNLIMITED)
            .unwrap();
        ids.push(event.id);
    }

    let events = store.get_events(ids[2], None, None).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "event_3");
    assert_eq!(events[1].event_type, "event_4");
}

#[test]
fn get_events_respects_limit() {
    let (store, _dir) = Store::open_temp();
    for i in 0..10 {
        store
            .add_event(format!("event_{i}"), "p", None, None, UNLIMITED)
            .unwrap();
    }
    assert_eq!(store.get_events(0, Some(3), None).unwrap().len(), 3);
}

#[test]
fn get_events_filters_by_channel_set() {
    let (store, _dir) = Store::open_temp();
    store
        .add_event("broadcast", "m1", Some("s1".into()), Some("all".into()), UNLIMITED)
        .unwrap();
    store
        .add_event(
            "direct",
            "m2",
            Some("s1".into()),
            Some("session:abc".into()),
            UNLIMITED,
        )
        .unwrap();
    store
        .add_event(
            "repo",
            "m3",
            Some("s1".into()),
            Some("repo:myrepo".into()),
            UNLIMITED,
        )
        .unwrap();
    store
        .add_event("other", "m4", Some("s1".into()), Some("session:xyz".into()), UNLIMITED)
        .unwrap();

    let channels = vec!["all".to_string(), "session:abc".to_string(), "repo:myrepo".to_string()];
    let events = store.get_events(0, None, Some(&channels)).unwrap();
    assert_eq!(events.len(), 3);
    let types: std::collections::HashSet<_> = events.iter().map(|e| e.event_type.clone()).collect();
    assert_eq!(
        types,
        ["broadcast", "direct", "repo"].into_iter().map(String::from).collect()
    );
}

#[test]
fn get_events_no_filter_returns_everything() {
    let (store, _dir) = Store::open_temp();
    for ch in ["all", "session:abc", "repo:myrepo"] {
        store
            .add_event("e", "m", Some("s1".into()), Some(ch.to_string()), UNLIMITED)
            .unwrap();
    }
    assert_eq!(store.get_events(0, None, None).unwrap().len(), 3);
}

#[test]
fn get_last_event_id_is_zero_when_empty() {
    let (store, _dir) = Store::open_temp();
    assert_eq!(store.get_last_event_id().unwrap(), 0);
}

#[test]
fn get_last_event_id_tracks_latest() {
    let (store, _dir) = Store::open_temp();
    for i in 0..3 {
        store
            .add_event(format!("event_{i}"), "p", None, None, UNLIMITED)
            .unwrap();
    }
    assert_eq!(store.get_last_event_id().unwrap(), 3);
}

#[test]
fn retention_trims_to_max_events_keeping_highest_ids() {
    let (store, _dir) = Store::open_temp();
    for i in 0..15 {
        store
            .add_event(format!("event_{i}"), "p", None, None, 10)
            .unwrap();
    }

    let events = store.get_events(0, Some(100), None).unwrap();
    assert_eq!(events.len(), 10);
    assert_eq!(events.first().unwrap().event_type, "event_5");
    assert_eq!(events.last().unwrap().event_type, "event_14");
}
