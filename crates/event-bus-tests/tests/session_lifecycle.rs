use event_bus_core::config::EventBusConfig;
use event_bus_core::engine::EventBus;

fn test_engine() -> (EventBus, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EventBusConfig::default();
    config.db_path = dir.path().join("event-bus.redb");
    (EventBus::new(config).unwrap(), dir)
}

#[test]
fn register_then_list_reports_the_session() {
    let (engine, _dir) = test_engine();
    let registered = engine
        .register_session(None, "/home/user/myrepo".into(), Some(4242))
        .unwrap();

    let sessions = engine.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, registered.session_id);
    assert_eq!(sessions[0].repo, "myrepo");
    assert!(sessions[0].alive);
}

#[test]
fn re_registering_the_same_triple_replaces_the_prior_session() {
    let (engine, _dir) = test_engine();
    let first = engine
        .register_session(None, "/home/user/myrepo".into(), Some(100))
        .unwrap();
    let second = engine
        .register_session(None, "/home/user/myrepo".into(), Some(100))
        .unwrap();

    assert_ne!(first.session_id, second.session_id);
    let sessions = engine.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, second.session_id);
}

#[test]
fn unregister_unknown_session_id_does_not_error() {
    let (engine, _dir) = test_engine();
    let result = engine.unregister_session("not-a-real-session").unwrap();
    assert!(!result.success);
}
