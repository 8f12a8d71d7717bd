//! Session persistence
//!
//! `SessionStore` speaks a minimal key-value protocol so the backend is
//! swappable. Two built-ins ship: an in-memory store for tests and a
//! JSON-file store for the CLI. Concurrent saves of the same session are
//! last-write-wins; the store does not merge.

use crate::error::{Result, ResumeOptimizerError};
use crate::pipeline::context::{PipelineExecutionContext, PipelineState};
use chrono::{Duration, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

const SESSION_PREFIX: &str = "pipeline:session:";
const STATE_PREFIX: &str = "pipeline:state:";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    /// All keys beginning with `prefix`, in unspecified order.
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ResumeOptimizerError::Storage("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ResumeOptimizerError::Storage("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ResumeOptimizerError::Storage("store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ResumeOptimizerError::Storage("store lock poisoned".to_string()))?;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// JSON-file backend: one file per key under the storage directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    // ':' is illegal in filenames on some platforms. '@' never appears in
    // keys, so the mapping is reversible.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "@")))
    }

    fn key_for(file_stem: &str) -> String {
        file_stem.replace('@', ":")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let key = Self::key_for(stem);
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Session-level operations layered over any key-value backend.
pub struct SessionStore<S: KeyValueStore> {
    backend: S,
    max_sessions: usize,
    max_session_age_hours: i64,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S, max_sessions: usize, max_session_age_hours: i64) -> Self {
        Self {
            backend,
            max_sessions,
            max_session_age_hours,
        }
    }

    /// Persist the full context plus its state projection, then enforce
    /// the session cap.
    pub fn save(&self, context: &PipelineExecutionContext) -> Result<()> {
        let session_key = format!("{}{}", SESSION_PREFIX, context.session_id);
        let state_key = format!("{}{}", STATE_PREFIX, context.session_id);

        self.backend
            .put(&session_key, &serde_json::to_string(context)?)?;
        self.backend
            .put(&state_key, &serde_json::to_string(&context.state())?)?;

        self.cleanup_old_sessions()?;
        debug!("saved session {}", context.session_id);
        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<PipelineExecutionContext> {
        let key = format!("{}{}", SESSION_PREFIX, session_id);
        let Some(json) = self.backend.get(&key)? else {
            return Err(ResumeOptimizerError::SessionNotFound(session_id.to_string()));
        };
        Ok(serde_json::from_str(&json)?)
    }

    pub fn load_state(&self, session_id: &str) -> Result<PipelineState> {
        let key = format!("{}{}", STATE_PREFIX, session_id);
        let Some(json) = self.backend.get(&key)? else {
            return Err(ResumeOptimizerError::SessionNotFound(session_id.to_string()));
        };
        Ok(serde_json::from_str(&json)?)
    }

    pub fn delete(&self, session_id: &str) -> Result<()> {
        self.backend
            .delete(&format!("{}{}", SESSION_PREFIX, session_id))?;
        self.backend
            .delete(&format!("{}{}", STATE_PREFIX, session_id))?;
        Ok(())
    }

    /// All of a user's sessions, newest first.
    pub fn get_user_sessions(&self, user_id: &str) -> Result<Vec<PipelineState>> {
        let mut states = self.all_states()?;
        states.retain(|s| s.user_id == user_id);
        states.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(states)
    }

    /// A session is resumable while it is younger than the configured age.
    pub fn can_resume(&self, session_id: &str) -> Result<bool> {
        let state = self.load_state(session_id)?;
        let age = Utc::now() - state.started_at;
        Ok(age < Duration::hours(self.max_session_age_hours))
    }

    fn all_states(&self) -> Result<Vec<PipelineState>> {
        let mut states = Vec::new();
        for key in self.backend.keys(STATE_PREFIX)? {
            let Some(json) = self.backend.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<PipelineState>(&json) {
                Ok(state) => states.push(state),
                Err(e) => warn!("skipping unreadable session state {}: {}", key, e),
            }
        }
        Ok(states)
    }

    /// Evict the oldest sessions (by start time) beyond the cap. Runs
    /// after every save.
    fn cleanup_old_sessions(&self) -> Result<()> {
        let mut states = self.all_states()?;
        if states.len() <= self.max_sessions {
            return Ok(());
        }
        states.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        let excess = states.len() - self.max_sessions;
        for state in states.iter().take(excess) {
            debug!("evicting session {} past the cap", state.session_id);
            self.delete(&state.session_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), 10, 24)
    }

    fn context(user: &str) -> PipelineExecutionContext {
        PipelineExecutionContext::new(user, "a job description", None)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = store();
        let ctx = context("user-1");
        store.save(&ctx).unwrap();

        let loaded = store.load(&ctx.session_id).unwrap();
        assert_eq!(loaded.session_id, ctx.session_id);
        assert_eq!(loaded.user_id, "user-1");
    }

    #[test]
    fn test_load_missing_session_is_not_found() {
        let store = store();
        let err = store.load("sess_0_deadbeef").unwrap_err();
        assert!(matches!(
            err,
            ResumeOptimizerError::SessionNotFound(_)
        ));
    }

    #[test]
    fn test_eleventh_save_evicts_exactly_the_oldest() {
        let store = store();
        let mut contexts = Vec::new();
        for i in 0..11 {
            let mut ctx = context("user-1");
            // Spread start times so eviction order is unambiguous
            ctx.started_at = Utc::now() - Duration::minutes(60 - i);
            contexts.push(ctx);
        }
        for ctx in &contexts {
            store.save(ctx).unwrap();
        }

        let oldest = &contexts[0];
        assert!(store.load(&oldest.session_id).is_err());
        for ctx in &contexts[1..] {
            assert!(store.load(&ctx.session_id).is_ok(), "{}", ctx.session_id);
        }
        assert_eq!(store.get_user_sessions("user-1").unwrap().len(), 10);
    }

    #[test]
    fn test_user_sessions_are_newest_first() {
        let store = store();
        let mut older = context("user-1");
        older.started_at = Utc::now() - Duration::hours(2);
        let newer = context("user-1");
        let other = context("user-2");
        store.save(&older).unwrap();
        store.save(&newer).unwrap();
        store.save(&other).unwrap();

        let sessions = store.get_user_sessions("user-1").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, newer.session_id);
        assert_eq!(sessions[1].session_id, older.session_id);
    }

    #[test]
    fn test_can_resume_respects_age_limit() {
        let store = store();
        let fresh = context("user-1");
        store.save(&fresh).unwrap();
        assert!(store.can_resume(&fresh.session_id).unwrap());

        let mut stale = context("user-1");
        stale.started_at = Utc::now() - Duration::hours(25);
        store.save(&stale).unwrap();
        assert!(!store.can_resume(&stale.session_id).unwrap());
    }

    #[test]
    fn test_delete_removes_both_records() {
        let store = store();
        let ctx = context("user-1");
        store.save(&ctx).unwrap();
        store.delete(&ctx.session_id).unwrap();
        assert!(store.load(&ctx.session_id).is_err());
        assert!(store.load_state(&ctx.session_id).is_err());
    }

    #[test]
    fn test_save_is_last_write_wins() {
        let store = store();
        let mut ctx = context("user-1");
        store.save(&ctx).unwrap();
        ctx.user_input_required = true;
        store.save(&ctx).unwrap();

        let loaded = store.load(&ctx.session_id).unwrap();
        assert!(loaded.user_input_required);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileStore::new(dir.path().to_path_buf()).unwrap();
        let store = SessionStore::new(backend, 10, 24);
        let ctx = context("user-1");
        store.save(&ctx).unwrap();

        let loaded = store.load(&ctx.session_id).unwrap();
        assert_eq!(loaded.session_id, ctx.session_id);
        assert!(store.can_resume(&ctx.session_id).unwrap());
    }
}
