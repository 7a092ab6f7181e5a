use serde_json::Value;

use super::{keys, KvStore};
use crate::error::StorageError;
use crate::timer::SessionRecord;

/// Session history helpers on top of any [`KvStore`].
///
/// The history is append-only; [`SessionLog::clear_sessions`] is the only way
/// to remove records.
pub trait SessionLog: KvStore {
    /// History as stored. A missing or unparsable value reads as empty, and
    /// an entry that cannot be decoded is skipped; only a failing store is
    /// an error.
    fn try_sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(stored_entries(self)?
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| decode_entry(index, entry))
            .collect())
    }

    /// History, or empty if it cannot be read.
    fn sessions(&self) -> Vec<SessionRecord> {
        self.try_sessions().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load sessions");
            Vec::new()
        })
    }

    /// Append one record (read-modify-write). Stored entries are written back
    /// as they were, including ones this version cannot decode.
    fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let corrupt = |e: serde_json::Error| StorageError::Corrupt {
            key: keys::SESSIONS.to_string(),
            message: e.to_string(),
        };
        let mut entries = stored_entries(self)?;
        entries.push(serde_json::to_value(record).map_err(corrupt)?);
        let json = serde_json::to_string(&entries).map_err(corrupt)?;
        self.set(keys::SESSIONS, &json)
    }

    fn clear_sessions(&self) -> Result<(), StorageError> {
        self.set(keys::SESSIONS, "[]")
    }
}

/// Raw entries of the stored history array.
fn stored_entries<S: KvStore + ?Sized>(store: &S) -> Result<Vec<Value>, StorageError> {
    let Some(json) = store.get(keys::SESSIONS)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&json) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            tracing::warn!(error = %e, "stored sessions are corrupt, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn decode_entry(index: usize, entry: Value) -> Option<SessionRecord> {
    match serde_json::from_value(entry) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(index, error = %e, "skipping undecodable session");
            None
        }
    }
}

impl<T: KvStore + ?Sized> SessionLog for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Utc;

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    fn record(id: i64, duration: u64) -> SessionRecord {
        SessionRecord {
            id,
            duration,
            category: "Coding".into(),
            distractions: 0,
            pause_count: 0,
            date: Utc::now(),
        }
    }

    #[test]
    fn append_preserves_order() {
        let store = MemoryStore::new();
        store.save_session(&record(1, 60)).unwrap();
        store.save_session(&record(2, 120)).unwrap();
        let ids: Vec<_> = store.sessions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn missing_history_is_empty() {
        let store = MemoryStore::new();
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn corrupt_history_is_empty() {
        let store = MemoryStore::new();
        store.set(keys::SESSIONS, "{not json").unwrap();
        assert!(store.try_sessions().unwrap().is_empty());
    }

    #[test]
    fn null_counters_keep_the_whole_history() {
        let store = MemoryStore::new();
        store
            .set(
                keys::SESSIONS,
                r#"[{"id":1,"duration":600,"category":"Coding","distractions":0,"pauseCount":1,"date":"2026-10-17T09:00:00Z"},
                    {"id":2,"duration":300,"category":"Reading","distractions":null,"pauseCount":null,"date":"2026-10-18T09:00:00Z"}]"#,
            )
            .unwrap();

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].distractions, 0);

        store.save_session(&record(3, 60)).unwrap();
        let ids: Vec<_> = store.sessions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn undecodable_entry_is_skipped_but_kept() {
        let store = MemoryStore::new();
        store
            .set(
                keys::SESSIONS,
                r#"[{"id":1,"duration":600,"date":"2026-10-17T09:00:00Z"},{"id":"x","date":"yesterday"}]"#,
            )
            .unwrap();

        let ids: Vec<_> = store.sessions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);

        store.save_session(&record(3, 60)).unwrap();
        let stored: Vec<Value> =
            serde_json::from_str(&store.get(keys::SESSIONS).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1]["id"], "x");
        let ids: Vec<_> = store.sessions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn clear_resets_to_empty_array() {
        let store = MemoryStore::new();
        store.save_session(&record(1, 60)).unwrap();
        store.clear_sessions().unwrap();
        assert_eq!(store.get(keys::SESSIONS).unwrap().as_deref(), Some("[]"));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn failing_store_surfaces_errors_but_sessions_is_empty() {
        let store = BrokenStore;
        assert!(store.try_sessions().is_err());
        assert!(store.sessions().is_empty());
        assert!(store.save_session(&record(1, 60)).is_err());
        assert!(store.clear_sessions().is_err());
    }
}
