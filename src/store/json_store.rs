use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::session::solve::{SolveId, SolveRecord};
use crate::store::backend::KeyValueStore;
use crate::store::schema::{SESSION_KEY, SessionEnvelope};

/// 4.5 MiB: close enough to a typical 5 MiB quota to be worth a warning.
pub const DEFAULT_SIZE_WARNING_BYTES: usize = 4_718_592;

/// Reads and writes the solve list as a versioned JSON envelope.
pub struct SessionStore<B: KeyValueStore> {
    backend: B,
    size_warning_bytes: usize,
}

impl<B: KeyValueStore> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            size_warning_bytes: DEFAULT_SIZE_WARNING_BYTES,
        }
    }

    pub fn with_size_warning(mut self, bytes: usize) -> Self {
        self.size_warning_bytes = bytes;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Load the stored session. Never fails: a missing key is an empty
    /// session, and a corrupt envelope is discarded and reported as empty.
    pub fn load(&mut self) -> Vec<SolveRecord> {
        let raw = match self.backend.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read stored session");
                return Vec::new();
            }
        };

        match serde_json::from_str::<SessionEnvelope>(&raw) {
            Ok(envelope) => {
                let mut seen = HashSet::new();
                let solves: Vec<SolveRecord> = envelope
                    .solves
                    .into_iter()
                    .map(|mut stored| {
                        if !seen.insert(stored.id.clone()) {
                            let fresh = SolveId::generate().to_string();
                            warn!(
                                id = %stored.id,
                                new_id = %fresh,
                                "duplicate solve id, reassigning"
                            );
                            stored.id = fresh.clone();
                            seen.insert(fresh);
                        }
                        stored.into_record()
                    })
                    .collect();
                info!(count = solves.len(), version = %envelope.version, "loaded session");
                solves
            }
            Err(e) => {
                warn!(error = %e, "stored session is corrupted, resetting");
                if let Err(e) = self.backend.remove(SESSION_KEY) {
                    error!(error = %e, "failed to discard corrupted session");
                }
                Vec::new()
            }
        }
    }

    /// Serialize and write `solves`, returning the number of bytes written.
    pub fn try_save(&mut self, solves: &[SolveRecord]) -> Result<usize, StoreError> {
        let last_modified = Utc::now().timestamp_millis().max(0) as u64;
        let envelope = SessionEnvelope::from_solves(solves, last_modified);
        let json = serde_json::to_string(&envelope)?;

        if json.len() > self.size_warning_bytes {
            warn!(
                bytes = json.len(),
                threshold = self.size_warning_bytes,
                "session is approaching the storage limit"
            );
        }

        self.backend.set(SESSION_KEY, &json)?;
        debug!(bytes = json.len(), count = solves.len(), "saved session");
        Ok(json.len())
    }

    /// Like [`try_save`](Self::try_save), but failures are logged and swallowed.
    /// The in-memory list stays authoritative; the next save tries again.
    pub fn save(&mut self, solves: &[SolveRecord]) -> bool {
        match self.try_save(solves) {
            Ok(_) => true,
            Err(e) if e.is_quota() => {
                error!(error = %e, "storage is full, session kept in memory only");
                false
            }
            Err(e) => {
                error!(error = %e, "failed to save session");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::solve::{Penalty, PuzzleType};
    use crate::store::backend::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn sample_solves() -> Vec<SolveRecord> {
        let mut solves = vec![
            SolveRecord::new(10_000, "R U R'", PuzzleType::Cube3),
            SolveRecord::new(11_500, "F2 B", PuzzleType::Cube4),
            SolveRecord::new(9_000, "R++ D--", PuzzleType::Megaminx),
        ];
        solves[1].set_penalty(Penalty::PlusTwo);
        solves[2].set_penalty(Penalty::Dnf);
        solves
    }

    #[test]
    fn test_missing_key_loads_empty() {
        let mut store = SessionStore::new(MemoryStore::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_is_equivalent() {
        let solves = sample_solves();
        let mut store = SessionStore::new(MemoryStore::new());
        assert!(store.save(&solves));

        let loaded = store.load();
        assert_eq!(loaded, solves);
        assert!(loaded[2].penalized_time_f64().is_infinite());
        assert_eq!(loaded[1].display_time(), "13.50+");
    }

    #[test]
    fn test_file_backed_round_trip() {
        let dir = TempDir::new().unwrap();
        let solves = sample_solves();
        {
            let backend = FileStore::with_base_dir(dir.path().to_path_buf()).unwrap();
            SessionStore::new(backend).save(&solves);
        }
        let backend = FileStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(SessionStore::new(backend).load(), solves);
    }

    #[test]
    fn test_malformed_payload_resets_store() {
        let mut backend = MemoryStore::new();
        backend.set(SESSION_KEY, "invalid json{").unwrap();
        let mut store = SessionStore::new(backend);

        assert!(store.load().is_empty());
        assert!(store.backend().raw(SESSION_KEY).is_none());
    }

    #[test]
    fn test_wrong_shape_resets_store() {
        for payload in ["[1,2,3]", r#"{"version":"1.0.0","solves":"nope"}"#, "42"] {
            let mut backend = MemoryStore::new();
            backend.set(SESSION_KEY, payload).unwrap();
            let mut store = SessionStore::new(backend);
            assert!(store.load().is_empty(), "{payload}");
            assert!(store.backend().raw(SESSION_KEY).is_none());
        }
    }

    #[test]
    fn test_out_of_range_time_resets_store() {
        let mut backend = MemoryStore::new();
        let payload = r#"{"solves":[{"id":"a","timeMs":1e30,"penalty":"+2","scramble":"R"}]}"#;
        backend.set(SESSION_KEY, payload).unwrap();
        let mut store = SessionStore::new(backend);

        assert!(store.load().is_empty());
        assert!(store.backend().raw(SESSION_KEY).is_none());
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let mut backend = MemoryStore::new();
        let payload = r#"{"solves":[
            {"id":"a","timeMs":10000},
            {"id":"a","timeMs":11000},
            {"id":"b","timeMs":12000}
        ]}"#;
        backend.set(SESSION_KEY, payload).unwrap();
        let mut store = SessionStore::new(backend);

        let loaded = store.load();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].id().as_str(), "a");
        assert_ne!(loaded[1].id().as_str(), "a");
        assert_ne!(loaded[1].id(), loaded[2].id());
        assert_eq!(loaded[1].raw_time_ms(), 11_000);
        assert_eq!(loaded[2].id().as_str(), "b");
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let mut store = SessionStore::new(MemoryStore::new().with_quota(Some(80)));
        assert!(!store.save(&sample_solves()));
        assert!(store.try_save(&sample_solves()).unwrap_err().is_quota());
        assert!(store.save(&[]));
    }

    #[test]
    fn test_oversize_save_still_writes() {
        let mut store = SessionStore::new(MemoryStore::new()).with_size_warning(10);
        let bytes = store.try_save(&sample_solves()).unwrap();
        assert!(bytes > 10);
        assert_eq!(store.load().len(), 3);
    }

    #[test]
    fn test_stored_json_uses_null_for_dnf() {
        let mut store = SessionStore::new(MemoryStore::new());
        store.save(&sample_solves());
        let raw = store.backend().raw(SESSION_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert!(value["solves"][2]["penalizedTimeMs"].is_null());
        assert!(value["lastModified"].as_u64().unwrap() > 0);
    }
}
