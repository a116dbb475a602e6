//! Dot-path extraction from the last tool result
//!
//! Paths look like `structuredContent.items.0.id` or `$.sum`. Mapping
//! segments are keys, sequence segments are zero-based indices. A `null`
//! leaf is reported exactly like a missing key.

use serde_json::Value;

use crate::common::{Error, Result};

/// Path that yields the serialized last response instead of a lookup
pub const RAW_RESPONSE: &str = "rawResponse";

const STRUCTURED_PREFIX: &str = "structuredContent.";
const ROOT_PREFIX: &str = "$.";

/// Resolve `path` against `root`
pub fn extract<'a>(root: &'a Value, path: &str) -> Result<&'a Value> {
    let path = path.strip_prefix(ROOT_PREFIX).unwrap_or(path);

    if let Some(inner) = path.strip_prefix(STRUCTURED_PREFIX) {
        // Real results carry a `structuredContent` key; bare results don't.
        // If neither form resolves, report the full path's error.
        return resolve(root, path).or_else(|err| resolve(root, inner).map_err(|_| err));
    }

    resolve(root, path)
}

fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = root;

    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| Error::Path(format!("path '{}' not found: no key '{}'", path, segment)))?,
            Value::Array(items) => {
                let idx: usize = segment.parse().map_err(|_| {
                    Error::Path(format!(
                        "path '{}': '{}' is not a valid array index",
                        path, segment
                    ))
                })?;
                items.get(idx).ok_or_else(|| {
                    Error::Path(format!(
                        "path '{}': index {} out of bounds (length {})",
                        path,
                        idx,
                        items.len()
                    ))
                })?
            }
            _ => {
                return Err(Error::Path(format!(
                    "path '{}': cannot navigate into a scalar at '{}'",
                    path, segment
                )))
            }
        };
    }

    if current.is_null() {
        return Err(Error::Path(format!("path '{}' not found: value is null", path)));
    }
    Ok(current)
}

/// Default string form of a resolved value
///
/// Strings are returned without quotes, integral numbers without a
/// fractional part, containers as compact JSON.
pub fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    return format!("{}", f as i64);
                }
            }
            n.to_string()
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
