//! Session backends: the host side of a session.
//!
//! A [`SessionBackend`] owns the live session mapping for one request. It knows whether a session
//! is already open, whether the request carries evidence of an earlier one (a session cookie), and
//! how to open or resume it. The [`Session`](crate::session::Session) accessor drives it and never
//! touches cookies or storage itself.
//!
//! [`CookieSession`] is the reference backend. The session id travels in a cookie and the
//! records live in a [`SessionStore`](crate::store::SessionStore).
//!
//! ```rust
//! use std::sync::Arc;
//! use page_session::backend::{CookieSession, SessionBackend};
//! use page_session::config::SessionConfig;
//! use page_session::request::RequestInfo;
//! use page_session::store::InMemorySessionStore;
//!
//! let store = Arc::new(InMemorySessionStore::new());
//! let mut backend = CookieSession::new(store, SessionConfig::default(), &RequestInfo::page());
//!
//! assert!(!backend.is_resumable());
//! backend.start().unwrap();
//! assert!(backend.is_active());
//! assert!(backend.set_cookie_header().is_some());
//! ```

use std::fmt::Display;

use http::HeaderValue;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::errors::SessionError;
use crate::path::SessionData;
use crate::request::RequestInfo;
use crate::store::SessionStoreHandle;

/// Host interface used by the session accessor.
pub trait SessionBackend {
    /// A session is open for this request.
    fn is_active(&self) -> bool;

    /// The request carries a session cookie.
    fn has_cookie(&self) -> bool;

    /// A session exists or can be inferred from the request.
    fn is_resumable(&self) -> bool {
        self.is_active() || self.has_cookie()
    }

    /// Opens a new session or resumes the one named by the request.
    fn start(&mut self) -> Result<(), SessionError>;

    /// Identifier of the open session.
    fn id(&self) -> Option<&str>;

    /// The live session mapping, if a session is open.
    fn data(&self) -> Option<&SessionData>;

    /// Mutable access to the live session mapping, if a session is open.
    fn data_mut(&mut self) -> Option<&mut SessionData>;

    /// Flash values were already rotated for this request.
    fn flash_rotated(&self) -> bool;

    /// Records that flash values were rotated for this request.
    fn mark_flash_rotated(&mut self);
}

impl<B: SessionBackend + ?Sized> SessionBackend for &mut B {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
    fn has_cookie(&self) -> bool {
        (**self).has_cookie()
    }
    fn is_resumable(&self) -> bool {
        (**self).is_resumable()
    }
    fn start(&mut self) -> Result<(), SessionError> {
        (**self).start()
    }
    fn id(&self) -> Option<&str> {
        (**self).id()
    }
    fn data(&self) -> Option<&SessionData> {
        (**self).data()
    }
    fn data_mut(&mut self) -> Option<&mut SessionData> {
        (**self).data_mut()
    }
    fn flash_rotated(&self) -> bool {
        (**self).flash_rotated()
    }
    fn mark_flash_rotated(&mut self) {
        (**self).mark_flash_rotated()
    }
}

/// A session identifier as carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Mints a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts a client-supplied identifier if it only uses cookie-safe id characters.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s.len() <= 128
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b',');
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct OpenSession {
    id: SessionId,
    data: SessionData,
    /// Minted during this request, so the client does not know the id yet
    fresh: bool,
}

/// Cookie-keyed session backed by a [`SessionStore`](crate::store::SessionStore).
pub struct CookieSession {
    store: SessionStoreHandle,
    config: SessionConfig,
    /// Id sent by the client, if it looked valid
    cookie_id: Option<SessionId>,
    open: Option<OpenSession>,
    /// Flash rotation already ran for this request
    flash_rotated: bool,
}

impl CookieSession {
    pub fn new(store: SessionStoreHandle, config: SessionConfig, request: &RequestInfo) -> Self {
        let cookie_id = request.cookie(&config.cookie_name).and_then(|raw| {
            let id = SessionId::parse(raw);
            if id.is_none() {
                log::debug!("Ignoring malformed {} cookie", config.cookie_name);
            }
            id
        });

        Self {
            store,
            config,
            cookie_id,
            open: None,
            flash_rotated: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Writes the session data back to the store. Does nothing when no session was opened.
    pub fn commit(&self) -> Result<(), SessionError> {
        match &self.open {
            Some(open) => {
                self.store.save(open.id.as_str(), &open.data)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// The `Set-Cookie` value to send when this request minted a new session id.
    pub fn set_cookie_header(&self) -> Option<HeaderValue> {
        let open = self.open.as_ref().filter(|o| o.fresh)?;
        HeaderValue::from_str(&self.config.set_cookie_value(open.id.as_str())).ok()
    }

    /// Deletes the session record and forgets the open session.
    pub fn destroy(&mut self) -> Result<(), SessionError> {
        if let Some(open) = self.open.take() {
            self.store.remove(open.id.as_str())?;
            log::debug!("Destroyed session {}", open.id);
        }
        self.cookie_id = None;
        Ok(())
    }
}

impl SessionBackend for CookieSession {
    fn is_active(&self) -> bool {
        self.open.is_some()
    }

    fn has_cookie(&self) -> bool {
        self.cookie_id.is_some()
    }

    fn start(&mut self) -> Result<(), SessionError> {
        if self.open.is_some() {
            return Ok(());
        }

        if let Some(id) = &self.cookie_id {
            if let Some(data) = self.store.load(id.as_str())? {
                log::debug!("Resumed session {id}");
                self.open = Some(OpenSession {
                    id: id.clone(),
                    data,
                    fresh: false,
                });
                return Ok(());
            }
            // Unknown ids are never adopted, a fresh one is minted instead.
            log::debug!("Session {id} not found in store");
        }

        let id = SessionId::new();
        log::debug!("Started new session {id}");
        self.open = Some(OpenSession {
            id,
            data: SessionData::new(),
            fresh: true,
        });
        Ok(())
    }

    fn id(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.id.as_str())
    }

    fn data(&self) -> Option<&SessionData> {
        self.open.as_ref().map(|o| &o.data)
    }

    fn data_mut(&mut self) -> Option<&mut SessionData> {
        self.open.as_mut().map(|o| &mut o.data)
    }

    fn flash_rotated(&self) -> bool {
        self.flash_rotated
    }

    fn mark_flash_rotated(&mut self) {
        self.flash_rotated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemorySessionStore, SessionStore};
    use serde_json::json;
    use std::sync::Arc;

    fn request_with(id: &str) -> RequestInfo {
        RequestInfo::page().with_cookie("SESSID", id)
    }

    #[test]
    fn session_id_validation() {
        assert!(SessionId::parse("abc-123,x").is_some());
        assert!(SessionId::parse("").is_none());
        assert!(SessionId::parse("a b").is_none());
        assert!(SessionId::parse("../etc").is_none());
        assert!(SessionId::parse(&"a".repeat(129)).is_none());

        let minted = SessionId::new();
        assert_eq!(minted.as_str().len(), 32);
        assert_eq!(SessionId::parse(minted.as_str()), Some(minted));
    }

    #[test]
    fn new_session_without_cookie() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut backend =
            CookieSession::new(store.clone(), SessionConfig::default(), &RequestInfo::page());

        assert!(!backend.has_cookie());
        assert!(!backend.is_resumable());
        assert_eq!(backend.id(), None);
        assert!(backend.data().is_none());

        backend.start().unwrap();
        assert!(backend.is_active());
        assert!(backend.is_resumable());
        let id = backend.id().unwrap().to_string();

        backend
            .data_mut()
            .unwrap()
            .insert("user".into(), json!({"id": 1}));
        backend.commit().unwrap();

        assert_eq!(
            store.load(&id).unwrap().unwrap().get("user"),
            Some(&json!({"id": 1}))
        );
        let cookie = backend.set_cookie_header().unwrap();
        assert!(cookie.to_str().unwrap().starts_with(&format!("SESSID={id};")));
    }

    #[test]
    fn resumes_known_cookie() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut data = SessionData::new();
        data.insert("user".into(), json!({"id": 100}));
        store.save("known1", &data).unwrap();

        let mut backend =
            CookieSession::new(store, SessionConfig::default(), &request_with("known1"));
        assert!(backend.has_cookie());
        assert!(backend.is_resumable());

        backend.start().unwrap();
        assert_eq!(backend.id(), Some("known1"));
        assert_eq!(backend.data(), Some(&data));
        // client already holds the cookie
        assert!(backend.set_cookie_header().is_none());
    }

    #[test]
    fn unknown_cookie_gets_fresh_id() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut backend =
            CookieSession::new(store, SessionConfig::default(), &request_with("forged"));

        backend.start().unwrap();
        assert_ne!(backend.id(), Some("forged"));
        assert!(backend.set_cookie_header().is_some());
    }

    #[test]
    fn malformed_cookie_is_ignored() {
        let store = Arc::new(InMemorySessionStore::new());
        let backend =
            CookieSession::new(store, SessionConfig::default(), &request_with("not valid"));
        assert!(!backend.has_cookie());
    }

    #[test]
    fn commit_without_start_writes_nothing() {
        let store = Arc::new(InMemorySessionStore::new());
        let backend =
            CookieSession::new(store.clone(), SessionConfig::default(), &RequestInfo::page());
        backend.commit().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn destroy_removes_record() {
        let store = Arc::new(InMemorySessionStore::new());
        store.save("known1", &SessionData::new()).unwrap();

        let mut backend =
            CookieSession::new(store.clone(), SessionConfig::default(), &request_with("known1"));
        backend.start().unwrap();
        backend.destroy().unwrap();

        assert!(!backend.is_active());
        assert!(!backend.is_resumable());
        assert!(store.is_empty().unwrap());
    }
}
