//! JSON-backed session store.
//!
//! `JsonSessionStore` persists **all** session records in a single JSON file:
//!
//! ```json
//! { "sessions": { "<id>": { "user": { "id": 100 } } } }
//! ```
//!
//! ### I/O characteristics & caveats
//! - Every call reads the whole file; `save` and `remove` rewrite it. For many concurrent
//!   visitors a database-backed store is a better fit.
//! - Access to the file is serialized through an internal lock, so one store instance is safe to
//!   share between threads. Two stores pointing at the same file are not coordinated.
//! - File writes are not atomic.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::path::SessionData;
use crate::store::SessionStore;

/// On-disk representation of all session records.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionStoreFile {
    sessions: HashMap<String, SessionData>,
}

/// A JSON-file session store.
pub struct JsonSessionStore {
    /// Path to the JSON file where sessions are stored.
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    io_lock: Mutex<()>,
}

impl JsonSessionStore {
    /// Opens the store at `path`, writing an empty file if none exists yet.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            let empty = serde_json::to_vec(&SessionStoreFile::default())?;
            fs::write(&path, empty)
                .with_context(|| format!("cannot create session file {}", path.display()))?;
        }

        Ok(Self {
            path,
            io_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_file(&self) -> Result<SessionStoreFile> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read session file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(SessionStoreFile::default());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("malformed session file {}", self.path.display()))
    }

    fn save_file(&self, file: &SessionStoreFile) -> Result<()> {
        let contents = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("cannot write session file {}", self.path.display()))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut SessionStoreFile),
    {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| anyhow!("session file lock poisoned: {e}"))?;
        let mut file = self.load_file()?;
        f(&mut file);
        self.save_file(&file)
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionData>> {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| anyhow!("session file lock poisoned: {e}"))?;
        let mut file = self.load_file()?;
        Ok(file.sessions.remove(id))
    }

    fn save(&self, id: &str, data: &SessionData) -> Result<()> {
        self.update(|file| {
            file.sessions.insert(id.to_string(), data.clone());
        })
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.update(|file| {
            file.sessions.remove(id);
        })
    }
}
