//! Session store infrastructure.
//!
//! A **session store** persists session data between requests, keyed by session id. It is the
//! durable side of a [`CookieSession`](crate::backend::CookieSession): the backend loads a record
//! when a request resumes a session and writes it back on commit.
//!
//! This module exports two reference implementations:
//! - [`InMemorySessionStore`]: process-local map (tests, single-process servers).
//! - [`JsonSessionStore`]: all sessions in one JSON file on disk.
//!
//! ## Design notes
//! - Stores are shared between requests, so implementations must be `Send + Sync` and
//!   synchronize internally. All trait methods take `&self`.
//! - Records are whole mappings. A store never merges; `save` replaces the record for `id`.
//! - Expiry and garbage collection are not handled here.
//!
//! ## Example
//! ```rust
//! use page_session::store::{InMemorySessionStore, SessionStore};
//!
//! let store = InMemorySessionStore::new();
//! let mut data = serde_json::Map::new();
//! data.insert("user".into(), serde_json::json!({"id": 100}));
//!
//! store.save("abc", &data).unwrap();
//! assert_eq!(store.load("abc").unwrap(), Some(data));
//! ```
mod in_memory;
mod json;

use std::sync::Arc;

use anyhow::Result;

use crate::path::SessionData;

/// In-memory session store.
pub use in_memory::InMemorySessionStore;
/// File-backed JSON session store (one file for all sessions).
pub use json::JsonSessionStore;

/// A session **store** keeps session records between requests.
pub trait SessionStore: Send + Sync {
    /// Loads the record for `id`, or `None` when no such session exists.
    fn load(&self, id: &str) -> Result<Option<SessionData>>;

    /// Writes the record for `id`, replacing any previous one.
    fn save(&self, id: &str, data: &SessionData) -> Result<()>;

    /// Removes the record for `id`. Removing an unknown id is not an error.
    fn remove(&self, id: &str) -> Result<()>;
}

/// Shared handle to a session store.
pub type SessionStoreHandle = Arc<dyn SessionStore>;
