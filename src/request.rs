//! Request classification and cookie lookup.
//!
//! The accessor only needs two facts about the incoming request: whether it is an interactive
//! page navigation (as opposed to a background `XMLHttpRequest`-style call), and which session
//! id, if any, the client sent back in its cookies.
//!
//! Both are read from an [`http::HeaderMap`]. [`RequestInfo`] keeps an owned copy of them so that
//! the request itself does not need to outlive the session accessor.

use http::header::COOKIE;
use http::HeaderMap;

/// Header set by script-driven requests.
pub const REQUESTED_WITH: &str = "x-requested-with";
const XML_HTTP_REQUEST: &str = "xmlhttprequest";

/// Tells the session accessor what kind of request it is serving.
pub trait RequestClassifier {
    /// Returns `true` for full page loads and `false` for background/XHR calls.
    fn is_page_navigation(&self) -> bool;
}

impl RequestClassifier for HeaderMap {
    fn is_page_navigation(&self) -> bool {
        match self.get(REQUESTED_WITH).and_then(|v| v.to_str().ok()) {
            Some(v) => !v.trim().eq_ignore_ascii_case(XML_HTTP_REQUEST),
            None => true,
        }
    }
}

impl RequestClassifier for bool {
    fn is_page_navigation(&self) -> bool {
        *self
    }
}

/// Owned snapshot of the request data used by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Request is a full page navigation
    pub page_navigation: bool,
    /// Cookies sent by the client, in header order
    pub cookies: Vec<(String, String)>,
}

impl RequestInfo {
    /// Captures the classification and cookies of a request from its headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            page_navigation: headers.is_page_navigation(),
            cookies: parse_cookies(headers),
        }
    }

    /// An interactive page request without cookies.
    pub fn page() -> Self {
        Self {
            page_navigation: true,
            cookies: Vec::new(),
        }
    }

    /// A background request without cookies.
    pub fn background() -> Self {
        Self {
            page_navigation: false,
            cookies: Vec::new(),
        }
    }

    /// Adds a cookie, as if the client had sent it.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    /// Returns the value of the first cookie called `name`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl RequestClassifier for RequestInfo {
    fn is_page_navigation(&self) -> bool {
        self.page_navigation
    }
}

/// Collects all `name=value` pairs from every `Cookie` header.
///
/// Pairs without `=` and headers that are not valid visible ASCII are skipped.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}
