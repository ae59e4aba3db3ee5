//! Record locator
//!
//! Finds the list of records inside a decoded response body. Simple paths are
//! walked directly; anything beyond the simple grammar is handed to
//! jsonpath-rust.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use jsonpath_rust::JsonPath;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// One step of a simple path: `.name`, `[name]`, `['name']`, `["name"]`, or a
/// terminal `[*]` / `.*`
static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:\.?([A-Za-z_][A-Za-z0-9_-]*)|\[\s*'([^']+)'\s*\]|\[\s*"([^"]+)"\s*\]|\[\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\]|(\[\s*\*\s*\]|\.\*))"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Wildcard,
}

enum Compiled {
    Simple(Vec<Segment>),
    Complex(JsonPath),
}

/// A parsed record path
///
/// Accepts `$[data][*]`, `$['data'][*]`, `$.data[*]`, `$.data.items` and bare
/// dotted paths like `data`. Filters and recursive descent are evaluated by
/// jsonpath-rust.
pub struct RecordLocator {
    path: String,
    compiled: Compiled,
}

impl RecordLocator {
    /// Parse a record path
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();

        let compiled = match parse_simple(&path) {
            Some(segments) => Compiled::Simple(segments),
            None => {
                let jp = JsonPath::try_from(path.as_str()).map_err(|e| {
                    Error::config(format!("Invalid record path '{path}': {e}"))
                })?;
                Compiled::Complex(jp)
            }
        };

        Ok(Self { path, compiled })
    }

    /// The path this locator was built from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the path is evaluated by the full JSONPath engine
    pub fn is_complex(&self) -> bool {
        matches!(self.compiled, Compiled::Complex(_))
    }

    /// Extract the records of a page, in body order.
    ///
    /// A missing (or null) top-level key yields no records. A missing nested
    /// key, a target that is not an array, or an element that is not an
    /// object is a schema error.
    pub fn locate(&self, body: &Value) -> Result<Vec<JsonObject>> {
        match &self.compiled {
            Compiled::Simple(segments) => self.locate_simple(body, segments),
            Compiled::Complex(jp) => match jp.find(body) {
                Value::Array(items) => self.collect_objects(&items),
                Value::Null => Ok(Vec::new()),
                other => Err(Error::schema(
                    &self.path,
                    format!("expected an array of records, found {}", kind(&other)),
                )),
            },
        }
    }

    fn locate_simple(&self, body: &Value, segments: &[Segment]) -> Result<Vec<JsonObject>> {
        let mut current = body;

        for (depth, segment) in segments.iter().enumerate() {
            let Segment::Key(key) = segment else {
                break;
            };

            let Some(object) = current.as_object() else {
                return Err(Error::schema(
                    &self.path,
                    format!("expected an object holding '{key}', found {}", kind(current)),
                ));
            };

            match object.get(key) {
                None | Some(Value::Null) if depth == 0 => return Ok(Vec::new()),
                Some(value) => current = value,
                None => {
                    return Err(Error::schema(&self.path, format!("missing key '{key}'")));
                }
            }
        }

        match current {
            Value::Array(items) => self.collect_objects(items),
            other => Err(Error::schema(
                &self.path,
                format!("expected an array of records, found {}", kind(other)),
            )),
        }
    }

    fn collect_objects(&self, items: &[Value]) -> Result<Vec<JsonObject>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(Error::schema(
                    format!("{}[{index}]", self.path),
                    format!("record is not an object, found {}", kind(other)),
                )),
            })
            .collect()
    }
}

impl std::fmt::Debug for RecordLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLocator")
            .field("path", &self.path)
            .field("complex", &self.is_complex())
            .finish()
    }
}

/// Parse the simple grammar, or `None` if the path needs full JSONPath
fn parse_simple(path: &str) -> Option<Vec<Segment>> {
    let trimmed = path.trim();
    let mut rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let mut segments = Vec::new();

    while !rest.is_empty() {
        let caps = SEGMENT_REGEX.captures(rest)?;
        let whole = caps.get(0)?;

        if caps.get(5).is_some() {
            segments.push(Segment::Wildcard);
        } else {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))?;
            segments.push(Segment::Key(key.as_str().to_string()));
        }

        rest = &rest[whole.end()..];
    }

    // A wildcard anywhere but last needs the full engine
    let inner = segments.len().saturating_sub(1);
    if segments[..inner].contains(&Segment::Wildcard) {
        return None;
    }

    Some(segments)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn key(name: &str) -> Segment {
        Segment::Key(name.to_string())
    }

    #[test]
    fn test_parse_simple_forms() {
        let data_all = vec![key("data"), Segment::Wildcard];

        assert_eq!(parse_simple("$[data][*]"), Some(data_all.clone()));
        assert_eq!(parse_simple("$['data'][*]"), Some(data_all.clone()));
        assert_eq!(parse_simple("$[\"data\"][*]"), Some(data_all.clone()));
        assert_eq!(parse_simple("$.data[*]"), Some(data_all.clone()));
        assert_eq!(parse_simple("$.data.*"), Some(data_all));
        assert_eq!(parse_simple("$.data.items"), Some(vec![key("data"), key("items")]));
        assert_eq!(parse_simple("data"), Some(vec![key("data")]));
        assert_eq!(parse_simple("$"), Some(vec![]));
    }

    #[test]
    fn test_parse_rejects_complex_forms() {
        assert_eq!(parse_simple("$..id"), None);
        assert_eq!(parse_simple("$.data[?(@.id > 1)]"), None);
        assert_eq!(parse_simple("$.data[*].items"), None);
        assert_eq!(parse_simple("$.data[0]"), None);
    }
}
