//! Flash values: data written during one interactive request and readable during the next.
//!
//! Flash data lives under a reserved top-level key of the session mapping:
//!
//! ```text
//! { "__flash__": { "next": { ... }, "now": { ... } } }
//! ```
//!
//! `next` collects values written during the current request. At the start of the following
//! interactive request, [`rotate`] promotes `next` to `now`. When nothing new was queued, the
//! whole namespace is dropped so that `now` never outlives a single request.
//!
//! User code must not store its own data under [`FLASH_KEY`].

use crate::path::SessionData;

/// Reserved top-level session key holding the flash namespace.
pub const FLASH_KEY: &str = "__flash__";
/// Values queued for the following request.
pub const NEXT: &str = "next";
/// Values delivered by the previous request.
pub const NOW: &str = "now";

/// Outcome of a flash rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// `next` was moved to `now`
    Promoted,
    /// Nothing was queued; the flash namespace was removed
    Cleared,
    /// No flash namespace was present
    Untouched,
}

/// Rotates the flash namespace of `data` for a new interactive request.
pub fn rotate(data: &mut SessionData) -> Rotation {
    let Some(flash) = data.get_mut(FLASH_KEY) else {
        return Rotation::Untouched;
    };

    let next = flash
        .as_object_mut()
        .and_then(|f| f.remove(NEXT))
        .filter(|v| !v.is_null());

    match next {
        Some(next) => {
            if let Some(f) = flash.as_object_mut() {
                f.insert(NOW.to_string(), next);
            }
            Rotation::Promoted
        }
        None => {
            data.remove(FLASH_KEY);
            Rotation::Cleared
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn data(v: Value) -> SessionData {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn promotes_next_over_now() {
        let mut d = data(json!({
            "user": 1,
            "__flash__": {"next": {"message": "hi"}, "now": {"message": "old", "x": 1}},
        }));

        assert_eq!(rotate(&mut d), Rotation::Promoted);
        assert_eq!(
            Value::Object(d),
            json!({"user": 1, "__flash__": {"now": {"message": "hi"}}})
        );
    }

    #[test]
    fn clears_consumed_namespace() {
        let mut d = data(json!({"user": 1, "__flash__": {"now": {"message": "hi"}}}));
        assert_eq!(rotate(&mut d), Rotation::Cleared);
        assert_eq!(Value::Object(d), json!({"user": 1}));
    }

    #[test]
    fn leaves_sessions_without_flash_alone() {
        let mut d = data(json!({"user": 1}));
        assert_eq!(rotate(&mut d), Rotation::Untouched);
        assert_eq!(Value::Object(d), json!({"user": 1}));
    }

    #[test]
    fn malformed_namespace_is_cleared() {
        let mut d = data(json!({"__flash__": "garbage"}));
        assert_eq!(rotate(&mut d), Rotation::Cleared);
        assert!(d.is_empty());
    }
}
