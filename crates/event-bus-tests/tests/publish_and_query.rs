use event_bus_core::config::EventBusConfig;
use event_bus_core::engine::EventBus;

fn test_engine() -> (EventBus, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EventBusConfig::default();
    config.db_path = dir.path().join("event-bus.redb");
    (EventBus::new(config).unwrap(), dir)
}

#[test]
fn publish_and_tail_returns_the_published_event() {
    let (engine, _dir) = test_engine();
    let published = engine.publish_event("hello", "world", None, None).unwrap();
    assert_eq!(published.event_id, 1);

    let events = engine.get_events(0, None, None, None).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, 1);
    assert_eq!(events[0].channel, "all");
    assert_eq!(events[0].payload, "world");
}

#[test]
fn channel_filter_isolates_a_single_event() {
    let (engine, _dir) = test_engine();
    engine.publish_event("a", "1", None, Some("all".into())).unwrap();
    engine.publish_event("b", "2", None, Some("session:A".into())).unwrap();
    engine.publish_event("c", "3", None, Some("repo:r".into())).unwrap();

    let events = engine
        .get_events(0, None, Some(vec!["session:A".to_string()]), None)
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].channel, "session:A");
}

#[test]
fn retention_keeps_the_max_events_highest_ids() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EventBusConfig::default();
    config.db_path = dir.path().join("event-bus.redb");
    config.max_events = 10;
    let engine = EventBus::new(config).unwrap();

    for i in 0..15 {
        engine.publish_event(format!("event_{i}"), "p", None, None).unwrap();
    }

    let events = engine.get_events(0, None, None, Some(100)).unwrap();
    assert_eq!(events.len(), 10);
    assert_eq!(events.first().unwrap().id, 6);
    assert_eq!(events.last().unwrap().id, 15);
}
