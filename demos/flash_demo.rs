//! Simulates a visitor posting a form and being redirected to a page that shows a flash message.
//!
//! Run with `RUST_LOG=debug` to see the session lifecycle.

use std::sync::Arc;

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use page_session::store::{InMemorySessionStore, SessionStoreHandle};
use page_session::{CookieSession, RequestInfo, Session, SessionConfig};
use serde_json::Value;

fn handle(
    store: &SessionStoreHandle,
    headers: &HeaderMap,
    f: impl FnOnce(&mut Session<CookieSession>),
) -> HeaderMap {
    let request = RequestInfo::from_headers(headers);
    let backend = CookieSession::new(store.clone(), SessionConfig::default(), &request);
    let mut session = Session::new(backend, request);

    f(&mut session);

    let backend = session.into_backend();
    if let Err(e) = backend.commit() {
        log::warn!("Cannot persist session: {e}");
    }

    let mut response = HeaderMap::new();
    if let Some(cookie) = backend.set_cookie_header() {
        response.insert(SET_COOKIE, cookie);
    }
    response
}

/// Flash messages are plain strings; anything else is not shown.
fn from_text(value: Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn main() {
    env_logger::init();

    let store: SessionStoreHandle = Arc::new(InMemorySessionStore::new());

    // POST /profile
    let response = handle(&store, &HeaderMap::new(), |s| {
        s.set("user.name", "Joe Bloggs");
        s.set_flash("message", "Profile saved");
    });

    let set_cookie = response
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    println!("Set-Cookie: {set_cookie}");

    let cookie = set_cookie.split(';').next().unwrap_or_default().to_string();
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(COOKIE, value);
    }

    // GET /profile (after redirect)
    handle(&store, &headers, |s| {
        println!("session {}", s.id());
        let name: String = s.get_as("user.name").unwrap_or_else(|| "stranger".into());
        println!("hello {name}");
        let message: String = s.get_flash("message").and_then(from_text).unwrap_or_default();
        println!("flash: {message}");
    });

    // GET /profile (reload)
    handle(&store, &headers, |s| {
        let message = s.get_flash("message").and_then(from_text);
        println!("flash after reload: {}", message.as_deref().unwrap_or("(none)"));
    });
}
