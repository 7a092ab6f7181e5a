//! Integration tests for persistence.
//!
//! This test file verifies:
//! - Settings survive a reopen of the SQLite store
//! - Session history append/clear through the context
//! - Histories written with camelCase keys and missing fields load

use fokus_core::storage::keys;
use fokus_core::{
    Config, FocusContext, KvStore, SessionLog, SessionTimer, SqliteStore, Theme, TimerOptions,
};

#[test]
fn test_settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fokus.db");

    {
        let mut ctx = FocusContext::load(SqliteStore::open_at(&path).unwrap(), Config::default());
        ctx.adjust_work(true);
        ctx.adjust_break(true);
        ctx.toggle_theme();
        ctx.set_category("Reading");
    }

    let ctx = FocusContext::load(SqliteStore::open_at(&path).unwrap(), Config::default());
    let settings = ctx.settings();
    assert_eq!(settings.work_minutes, 30);
    assert_eq!(settings.break_minutes, 6);
    assert_eq!(settings.theme, Theme::Light);
    assert_eq!(settings.last_category, "Reading");
}

#[test]
fn test_completed_sessions_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fokus.db");
    let ctx = FocusContext::load(SqliteStore::open_at(&path).unwrap(), Config::default());

    let mut timer = SessionTimer::new(TimerOptions {
        work_minutes: 1,
        ..TimerOptions::default()
    });
    for _ in 0..2 {
        timer.toggle();
        while let Some(token) = timer.tick_token() {
            if let Some(event) = timer.tick(token) {
                if let Some(record) = event.record() {
                    assert!(ctx.save_session(record));
                }
            }
        }
    }

    let reopened = SqliteStore::open_at(&path).unwrap();
    let sessions = reopened.sessions();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].id < sessions[1].id);
    assert!(sessions.iter().all(|s| s.duration == 60));
}

#[test]
fn test_legacy_history_shape_loads() {
    let store = SqliteStore::open_memory().unwrap();
    store
        .set(
            keys::SESSIONS,
            r#"[{"id":1700000000000,"duration":1500,"category":"Coding","distractions":2,"pauseCount":1,"date":"2026-10-01T08:00:00.000Z"},
                {"id":1700000000001,"duration":300,"category":"Reading","date":"2026-10-02T08:00:00.000Z"}]"#,
        )
        .unwrap();
    let sessions = store.sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].pause_count, 1);
    assert_eq!(sessions[1].distractions, 0);
}

#[test]
fn test_clear_then_append() {
    let store = SqliteStore::open_memory().unwrap();
    let ctx = FocusContext::load(store, Config::default());
    ctx.store().set(keys::SESSIONS, "garbage").unwrap();
    assert!(ctx.sessions().is_empty());
    assert!(ctx.clear_sessions());
    assert_eq!(ctx.store().get(keys::SESSIONS).unwrap().as_deref(), Some("[]"));
}
