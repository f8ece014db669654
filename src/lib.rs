//! Request-scoped session access with dotted paths and one-request flash values.
//!
//! - [`Session`] is the accessor built once per request.
//! - [`SessionBackend`] and [`RequestClassifier`] are what the host environment provides.
//! - [`CookieSession`] together with a [`store`] implementation is a ready-made host.

pub mod backend;
pub mod config;
pub mod errors;
pub mod flash;
pub mod path;
pub mod request;
pub mod session;
pub mod store;

pub use backend::{CookieSession, SessionBackend, SessionId};
pub use config::{SameSite, SessionConfig};
pub use errors::SessionError;
pub use path::{SessionData, SessionPath};
pub use request::{RequestClassifier, RequestInfo};
pub use session::{Session, StartState};
