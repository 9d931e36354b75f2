use crate::receiver::session::SessionState;
use crate::receiver::session_registry::{SessionRegistry, generate_session_id};
use crate::testing::RecordingBackend;
use bytes::Bytes;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

#[test]
fn test_session_id_format() {
    let id = generate_session_id();
    assert_eq!(id.len(), 16);
    assert!(id.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
}

#[test]
fn test_create_registers_unique_sessions() {
    let registry = SessionRegistry::default();
    let ids: HashSet<String> = (0..50).map(|_| registry.create().id().to_string()).collect();

    assert_eq!(ids.len(), 50);
    assert_eq!(registry.len(), 50);
    for id in &ids {
        assert!(registry.contains(id));
    }
}

#[test]
fn test_lookup_and_remove() {
    let registry = SessionRegistry::default();
    let session = registry.create();
    let id = session.id().to_string();

    assert!(registry.get(&id).is_some());
    assert!(registry.get("missing").is_none());

    let removed = registry.remove(&id).unwrap();
    assert_eq!(removed.id(), id);
    assert!(registry.is_empty());
    // Removal alone does not close
    assert_ne!(removed.state(), SessionState::Closed);
}

#[test]
fn test_teardown_closes_and_removes() {
    let registry = SessionRegistry::default();
    let session = registry.create();
    let id = session.id().to_string();

    assert!(registry.teardown(&id));
    assert!(!registry.contains(&id));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!registry.teardown(&id));
}

#[test]
fn test_ingest_routes_by_id() {
    let backend = RecordingBackend::new();
    let registry = SessionRegistry::default();
    let session = registry.create();
    session.arm().unwrap();

    assert!(!registry.ingest(session.id(), Bytes::from_static(b"armed")));
    session.start_streaming(backend.as_ref(), 4).unwrap();
    assert!(registry.ingest(session.id(), Bytes::from_static(b"live")));
    assert!(!registry.ingest("unknown", Bytes::from_static(b"x")));
}

#[test]
fn test_shutdown_closes_all() {
    let shutdown = CancellationToken::new();
    let registry = SessionRegistry::new(shutdown.clone());
    let sessions: Vec<_> = (0..3).map(|_| registry.create()).collect();

    assert_eq!(registry.shutdown(), 3);
    assert!(registry.is_empty());
    assert!(registry.ids().is_empty());
    for session in sessions {
        assert_eq!(session.state(), SessionState::Closed);
    }
}

#[test]
fn test_session_tokens_follow_registry_token() {
    let shutdown = CancellationToken::new();
    let registry = SessionRegistry::new(shutdown.clone());
    let session = registry.create();

    shutdown.cancel();
    assert!(session.cancel_token().is_cancelled());
}
