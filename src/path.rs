//! Session paths and the tree operations behind them.
//!
//! A [`SessionPath`] addresses a location inside the nested session mapping. It is built either
//! from an explicit list of segments ([`SessionPath::from_segments`]) or from a single dotted
//! string ([`SessionPath::parse`]). Accessor methods accept anything convertible into a path, so
//! both of these address the same value:
//!
//! ```rust
//! use page_session::path::SessionPath;
//!
//! assert_eq!(SessionPath::from("user.id"), SessionPath::from(["user", "id"]));
//! ```
//!
//! The free functions in this module ([`lookup`], [`upsert`], [`remove_at`], [`merge_missing`])
//! operate directly on a [`SessionData`] mapping and know nothing about session lifecycles.

use serde_json::{Map, Value};
use std::fmt::Display;

/// The top-level session mapping.
pub type SessionData = Map<String, Value>;

/// Ordered list of segments identifying a location in the session mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionPath {
    segments: Vec<String>,
}

impl SessionPath {
    /// Builds a path from explicit segments. Segments are taken verbatim, dots included.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits `dotted` on `.` into segments. An empty string yields a single empty segment.
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `prefix` placed in front of this path's segments.
    pub fn prefixed(&self, prefix: &[&str]) -> Self {
        let mut segments: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }
}

impl Display for SessionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for SessionPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SessionPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&String> for SessionPath {
    fn from(s: &String) -> Self {
        Self::parse(s)
    }
}

impl<const N: usize> From<[&str; N]> for SessionPath {
    fn from(segments: [&str; N]) -> Self {
        Self::from_segments(segments)
    }
}

impl From<&[&str]> for SessionPath {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments.iter().copied())
    }
}

impl From<Vec<String>> for SessionPath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&SessionPath> for SessionPath {
    fn from(path: &SessionPath) -> Self {
        path.clone()
    }
}

/// Finds the value at `segments`.
///
/// Returns `None` when a segment is missing, when an intermediate value is not a mapping, or when
/// the value found is `null`. An empty path addresses nothing.
pub fn lookup<'a>(data: &'a SessionData, segments: &[String]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let mut current = data.get(first)?;
    for name in rest {
        current = current.as_object()?.get(name)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Assigns `value` at `segments`, creating intermediate mappings as needed.
///
/// A non-mapping intermediate is replaced by an empty mapping. Keys next to the path are left
/// untouched. An empty path is ignored.
pub fn upsert(data: &mut SessionData, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        data.insert(first.clone(), value);
        return;
    }

    let child = data
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        upsert(map, rest, value);
    }
}

/// Removes the last segment of `segments` from its parent mapping and returns the old value.
///
/// Nothing is removed if a parent is missing or is not a mapping.
pub fn remove_at(data: &mut SessionData, segments: &[String]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = data;
    for name in parents {
        current = current.get_mut(name)?.as_object_mut()?;
    }
    current.remove(last)
}

/// Adds the entries of `incoming` whose keys are not yet present in `target`.
///
/// Keys already in `target` keep their value.
pub fn merge_missing(target: &mut SessionData, incoming: SessionData) {
    for (key, value) in incoming {
        target.entry(key).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(v: Value) -> SessionData {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    fn p(s: &str) -> Vec<String> {
        SessionPath::parse(s).segments().to_vec()
    }

    #[test]
    fn parse_and_segments_agree() {
        assert_eq!(SessionPath::parse("a.b.c"), SessionPath::from(["a", "b", "c"]));
        assert_eq!(SessionPath::parse("").segments(), &[String::new()]);
        assert!(SessionPath::from_segments(Vec::<String>::new()).is_empty());

        // explicit segments may contain dots
        let raw = SessionPath::from_segments(["a.b"]);
        assert_eq!(raw.segments().len(), 1);
        assert_eq!(raw.to_string(), "a.b");
    }

    #[test]
    fn prefixed_prepends_segments() {
        let path = SessionPath::parse("message.text").prefixed(&["__flash__", "next"]);
        assert_eq!(path.to_string(), "__flash__.next.message.text");
    }

    #[test]
    fn lookup_walks_nested_maps() {
        let d = data(json!({"user": {"id": 100, "tags": {"a": true}}}));
        assert_eq!(lookup(&d, &p("user.id")), Some(&json!(100)));
        assert_eq!(lookup(&d, &p("user.tags")), Some(&json!({"a": true})));
        assert_eq!(lookup(&d, &p("user.name")), None);
        assert_eq!(lookup(&d, &p("nobody")), None);
        assert_eq!(lookup(&d, &[]), None);
    }

    #[test]
    fn lookup_stops_at_scalars_and_nulls() {
        let d = data(json!({"user": {"id": 100}, "gone": null}));
        assert_eq!(lookup(&d, &p("user.id.deeper")), None);
        assert_eq!(lookup(&d, &p("gone")), None);
        assert_eq!(lookup(&d, &p("gone.x")), None);
    }

    #[test]
    fn upsert_creates_and_preserves_siblings() {
        let mut d = data(json!({"user": {"id": 100}, "cart": [1, 2]}));
        upsert(&mut d, &p("user.name"), json!("Joe"));
        upsert(&mut d, &p("prefs.theme.dark"), json!(true));

        assert_eq!(
            Value::Object(d),
            json!({
                "user": {"id": 100, "name": "Joe"},
                "cart": [1, 2],
                "prefs": {"theme": {"dark": true}},
            })
        );
    }

    #[test]
    fn upsert_replaces_scalar_intermediates() {
        let mut d = data(json!({"user": 5}));
        upsert(&mut d, &p("user.id"), json!(7));
        assert_eq!(Value::Object(d), json!({"user": {"id": 7}}));
    }

    #[test]
    fn upsert_with_empty_path_is_ignored() {
        let mut d = data(json!({"a": 1}));
        upsert(&mut d, &[], json!(2));
        assert_eq!(Value::Object(d), json!({"a": 1}));
    }

    #[test]
    fn remove_at_deletes_deepest_key_only() {
        let mut d = data(json!({"user": {"id": 100, "name": "Joe"}}));
        assert_eq!(remove_at(&mut d, &p("user.name")), Some(json!("Joe")));
        assert_eq!(Value::Object(d.clone()), json!({"user": {"id": 100}}));

        // missing parents leave the map alone
        assert_eq!(remove_at(&mut d, &p("nope.id")), None);
        assert_eq!(remove_at(&mut d, &p("user.id.x")), None);
        assert_eq!(Value::Object(d), json!({"user": {"id": 100}}));
    }

    #[test]
    fn merge_missing_keeps_existing_values() {
        let mut target = data(json!({"id": 100}));
        merge_missing(&mut target, data(json!({"id": 999, "name": "Joe"})));
        assert_eq!(Value::Object(target), json!({"id": 100, "name": "Joe"}));
    }
}
