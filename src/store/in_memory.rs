use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::path::SessionData;
use crate::store::SessionStore;

/// In-memory session store (no persistence). Records are lost when the store is dropped.
#[derive(Default)]
pub struct InMemorySessionStore {
    /// Session records per id
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> Result<usize> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| anyhow!("failed to acquire read lock: {e}"))?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionData>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| anyhow!("failed to acquire read lock: {e}"))?;
        Ok(sessions.get(id).cloned())
    }

    fn save(&self, id: &str, data: &SessionData) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| anyhow!("failed to acquire write lock: {e}"))?;
        sessions.insert(id.to_string(), data.clone());
        log::debug!("Saved session {id} ({} keys)", data.len());
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| anyhow!("failed to acquire write lock: {e}"))?;
        if sessions.remove(id).is_some() {
            log::debug!("Removed session {id}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> SessionData {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn save_load_remove() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.load("a").unwrap(), None);

        store.save("a", &record(json!({"user": {"id": 1}}))).unwrap();
        store.save("b", &record(json!({"cart": [1, 2]}))).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(
            store.load("a").unwrap(),
            Some(record(json!({"user": {"id": 1}})))
        );

        // save replaces the whole record
        store.save("a", &record(json!({"other": true}))).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(record(json!({"other": true}))));

        store.remove("a").unwrap();
        assert_eq!(store.load("a").unwrap(), None);
        assert_eq!(store.len().unwrap(), 1);

        // unknown ids are fine
        store.remove("zzz").unwrap();
    }

    #[test]
    fn poisoned_lock_is_an_error() {
        let store = std::sync::Arc::new(InMemorySessionStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.sessions.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(store.len().is_err());
        assert!(store.is_empty().is_err());
        assert!(store.load("a").is_err());
    }
}
