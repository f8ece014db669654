//! Request-scoped session accessor.
//!
//! A [`Session`] is built once per request from a [`SessionBackend`] and a [`RequestClassifier`].
//! It opens the backend lazily, on the first operation that needs it, and remembers the outcome
//! for the rest of the request:
//!
//! - `Unknown`: nothing has touched the session yet.
//! - `Active`: the backend was already open or opened successfully. If the request is a page
//!   navigation, the flash namespace has been rotated (see [`crate::flash`]).
//! - `Failed`: the backend could not be opened. Reads return their defaults and writes are
//!   dropped until the request ends.
//!
//! Reads (`get*`, `remove*`) additionally require the backend to be *resumable*. A visitor
//! without a session cookie therefore never gets a session just because something looked up a
//! key.
//!
//! # Example
//! ```rust
//! use std::sync::Arc;
//! use page_session::{CookieSession, RequestInfo, Session, SessionConfig};
//! use page_session::store::InMemorySessionStore;
//! use serde_json::json;
//!
//! let store = Arc::new(InMemorySessionStore::new());
//! let request = RequestInfo::page();
//! let backend = CookieSession::new(store, SessionConfig::default(), &request);
//! let mut session = Session::new(backend, request);
//!
//! session.set("user.id", 100);
//! session.add("user", json!({"id": 999, "name": "Joe"}).as_object().cloned().unwrap());
//! assert_eq!(session.get("user"), Some(json!({"id": 100, "name": "Joe"})));
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::backend::SessionBackend;
use crate::flash::{self, Rotation, FLASH_KEY, NEXT, NOW};
use crate::path::{self, SessionData, SessionPath};
use crate::request::{RequestClassifier, RequestInfo};

/// Lifecycle of the backend within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartState {
    Unknown,
    Active,
    Failed,
}

/// Dotted-path accessor over the session of a single request.
pub struct Session<B, R = RequestInfo> {
    backend: B,
    request: R,
    state: StartState,
}

impl<B: SessionBackend, R: RequestClassifier> Session<B, R> {
    pub fn new(backend: B, request: R) -> Self {
        Self {
            backend,
            request,
            state: StartState::Unknown,
        }
    }

    pub fn state(&self) -> StartState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ends the request and hands the backend back, e.g. to commit it.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Identifier of the session, or an empty string when no session could be opened.
    pub fn id(&mut self) -> &str {
        if self.started() {
            self.backend.id().unwrap_or("")
        } else {
            ""
        }
    }

    /// Stores `value` at `path`. `null` values are ignored.
    pub fn set(&mut self, path: impl Into<SessionPath>, value: impl Into<Value>) {
        self.set_at(&path.into(), value.into());
    }

    /// Returns the value at `path`.
    pub fn get(&mut self, path: impl Into<SessionPath>) -> Option<Value> {
        self.get_at(&path.into())
    }

    /// Returns the value at `path`, or `default` when there is none.
    pub fn get_or(&mut self, path: impl Into<SessionPath>, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// Returns the value at `path` deserialized as `T`. A value of another shape yields `None`.
    pub fn get_as<T: DeserializeOwned>(&mut self, path: impl Into<SessionPath>) -> Option<T> {
        let value = self.get(path)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("Session value has unexpected shape: {e}");
                None
            }
        }
    }

    /// Merges `values` into the mapping at `path`. Keys already present keep their value.
    ///
    /// A missing or non-mapping value at `path` is treated as an empty mapping.
    pub fn add(&mut self, path: impl Into<SessionPath>, values: SessionData) {
        self.add_at(&path.into(), values);
    }

    /// Removes the value at `path`.
    pub fn remove(&mut self, path: impl Into<SessionPath>) {
        self.remove_many([path]);
    }

    /// Removes the value at every path in `paths`.
    pub fn remove_many<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<SessionPath>,
    {
        if !self.resumed() {
            return;
        }
        let Some(data) = self.backend.data_mut() else {
            return;
        };
        for p in paths {
            let p = p.into();
            if path::remove_at(data, p.segments()).is_some() {
                log::debug!("Removed session key {p}");
            }
        }
    }

    /// Queues `value` at `path` for the next interactive request.
    pub fn set_flash(&mut self, path: impl Into<SessionPath>, value: impl Into<Value>) {
        let path = path.into().prefixed(&[FLASH_KEY, NEXT]);
        self.set_at(&path, value.into());
    }

    /// Returns the flash value at `path` delivered by the previous request.
    pub fn get_flash(&mut self, path: impl Into<SessionPath>) -> Option<Value> {
        let path = path.into().prefixed(&[FLASH_KEY, NOW]);
        self.get_at(&path)
    }

    pub fn get_flash_or(
        &mut self,
        path: impl Into<SessionPath>,
        default: impl Into<Value>,
    ) -> Value {
        self.get_flash(path).unwrap_or_else(|| default.into())
    }

    /// Carries the flash values of this request over to the next one.
    ///
    /// Values already queued with [`set_flash`](Self::set_flash) take precedence over the ones
    /// being carried forward.
    pub fn keep_flash(&mut self) {
        let now = SessionPath::from([FLASH_KEY, NOW]);
        if let Some(Value::Object(values)) = self.get_at(&now) {
            if !values.is_empty() {
                self.add_at(&SessionPath::from([FLASH_KEY, NEXT]), values);
            }
        }
    }

    fn set_at(&mut self, path: &SessionPath, value: Value) {
        if value.is_null() || !self.started() {
            return;
        }
        if let Some(data) = self.backend.data_mut() {
            path::upsert(data, path.segments(), value);
        }
    }

    fn get_at(&mut self, path: &SessionPath) -> Option<Value> {
        if !self.resumed() {
            return None;
        }
        let data = self.backend.data()?;
        if path.is_empty() {
            return Some(Value::Object(data.clone()));
        }
        path::lookup(data, path.segments()).cloned()
    }

    fn add_at(&mut self, path: &SessionPath, values: SessionData) {
        let mut current = match self.get_at(path) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        path::merge_missing(&mut current, values);
        self.set_at(path, Value::Object(current));
    }

    /// The request refers to a session and that session is open.
    fn resumed(&mut self) -> bool {
        if !self.backend.is_resumable() {
            log::trace!("No session to resume for this request");
            return false;
        }
        self.started()
    }

    fn started(&mut self) -> bool {
        if self.state == StartState::Unknown {
            self.state = self.open();
        }
        self.state == StartState::Active
    }

    fn open(&mut self) -> StartState {
        if !self.backend.is_active() {
            if let Err(e) = self.backend.start() {
                log::warn!("Session unavailable for this request: {e}");
                return StartState::Failed;
            }
        }

        if !self.request.is_page_navigation() {
            log::debug!("Background request, flash values left in place");
            return StartState::Active;
        }

        if self.backend.flash_rotated() {
            return StartState::Active;
        }

        let Some(data) = self.backend.data_mut() else {
            log::warn!("Session backend started without data");
            return StartState::Failed;
        };
        match flash::rotate(data) {
            Rotation::Promoted => log::debug!("Flash values promoted for this request"),
            Rotation::Cleared => log::debug!("Consumed flash values cleared"),
            Rotation::Untouched => {}
        }
        self.backend.mark_flash_rotated();
        StartState::Active
    }
}
