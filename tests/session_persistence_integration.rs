use chrono::{Duration, Utc};
use std::fs;
use std::sync::Arc;
use vixbuddy::infrastructure::mock::MemoryLogSink;
use vixbuddy::infrastructure::session_persistence::{PersistedSession, SessionCache};

fn session(valid_for: Option<Duration>) -> PersistedSession {
    PersistedSession {
        session_token: "token-abc".to_string(),
        remember_token: Some("remember-xyz".to_string()),
        username: Some("trader".to_string()),
        email: None,
        external_id: Some("U0001".to_string()),
        session_expiration: valid_for.map(|d| Utc::now() + d),
        saved_at: Utc::now(),
    }
}

#[test]
fn test_save_then_load_in_fresh_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let cache = SessionCache::new(&path, Arc::new(MemoryLogSink::new()));

    let saved = session(Some(Duration::hours(12)));
    cache.save(&saved).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    // A second cache over the same file sees what the first one wrote.
    let reopened = SessionCache::new(&path, Arc::new(MemoryLogSink::new()));
    assert_eq!(reopened.load(), Some(saved));
}

#[test]
fn test_missing_file_is_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(MemoryLogSink::new());
    let cache = SessionCache::new(dir.path().join("session.json"), log.clone());

    assert!(cache.load().is_none());
    assert!(log.lines().is_empty());
}

#[test]
fn test_corrupt_file_is_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{\"session_token\": ").unwrap();
    let log = Arc::new(MemoryLogSink::new());

    let cache = SessionCache::new(&path, log.clone());

    assert!(cache.load().is_none());
    assert_eq!(cache.path(), path.as_path());
    assert!(log.contains(&format!(
        "[session]: ignoring corrupt session file {}",
        path.display()
    )));
}

#[test]
fn test_expired_session_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::new(dir.path().join("session.json"), Arc::new(MemoryLogSink::new()));

    cache.save(&session(Some(Duration::minutes(-5)))).unwrap();
    assert!(cache.load().is_none());

    cache.save(&session(None)).unwrap();
    assert!(cache.load().is_some());
}

#[test]
fn test_clear_forgets_session() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::new(dir.path().join("session.json"), Arc::new(MemoryLogSink::new()));

    cache.save(&session(None)).unwrap();
    cache.clear().unwrap();
    assert!(cache.load().is_none());
    // Clearing twice is fine.
    cache.clear().unwrap();
}
