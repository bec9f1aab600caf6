//! Key normalization and dotted-path addressing.
//!
//! Every key that enters an adapter goes through [`normalize`], so `"abc"`,
//! `"ABC"` and `"  abc  "` all land on `"ABC"`. Nested keys (`"server.host"`)
//! are split on `.` and each segment is normalized on its own before the map
//! is walked.

use serde_json::{Map, Value};

use super::{ConfigError, Result};

/// Converts a key to its canonical form: trimmed, upper-cased, with each run
/// of spaces collapsed into a single `_`.
pub fn normalize(key: &str) -> String {
    key.trim()
        .to_uppercase()
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Returns true for names like `ABC` or `EASY_AS_123`: at least one cased
/// character and no lowercase ones.
pub fn is_uppercase_name(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

/// Reports whether `key` addresses a nested value.
///
/// Fails with [`ConfigError::MalformedKey`] if the key starts or ends with a
/// dot, or contains an empty segment (`..`).
pub fn is_nested(key: &str) -> Result<bool> {
    let key = key.trim();
    if key.starts_with('.') || key.ends_with('.') || key.contains("..") {
        return Err(ConfigError::MalformedKey(key.to_string()));
    }
    Ok(key.contains('.'))
}

fn segments(key: &str) -> Result<Vec<String>> {
    if !is_nested(key)? {
        return Ok(vec![normalize(key)]);
    }

    let segments: Vec<String> = key.trim().split('.').map(normalize).collect();
    // "a. .b" passes the dot checks but leaves a blank segment
    if segments.iter().any(String::is_empty) {
        return Err(ConfigError::MalformedKey(key.trim().to_string()));
    }
    Ok(segments)
}

/// Looks up `key` in `map`, walking nested mappings for dotted keys.
pub fn get<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    let segments = segments(key)?;
    let not_found = || ConfigError::KeyNotFound(key.to_string());

    let (first, rest) = segments.split_first().ok_or_else(not_found)?;
    let mut current = map.get(first).ok_or_else(not_found)?;
    let mut parent = first;

    for segment in rest {
        let table = current.as_object().ok_or_else(|| ConfigError::NotAMapping {
            key: key.to_string(),
            segment: parent.clone(),
        })?;
        current = table.get(segment).ok_or_else(not_found)?;
        parent = segment;
    }

    Ok(current)
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Value> {
    let segments = segments(key)?;
    let not_found = || ConfigError::KeyNotFound(key.to_string());

    let (first, rest) = segments.split_first().ok_or_else(not_found)?;
    let mut current = map.get_mut(first).ok_or_else(not_found)?;
    let mut parent = first;

    for segment in rest {
        let table = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::NotAMapping {
                key: key.to_string(),
                segment: parent.clone(),
            })?;
        current = table.get_mut(segment).ok_or_else(not_found)?;
        parent = segment;
    }

    Ok(current)
}

/// Assigns `value` at `key`, creating intermediate mappings as needed.
///
/// Returns the value previously stored at that key, if any.
pub fn set(map: &mut Map<String, Value>, key: &str, value: Value) -> Result<Option<Value>> {
    let segments = segments(key)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::MalformedKey(key.to_string()));
    };

    let mut table = map;
    for segment in parents {
        let entry = table
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        table = entry
            .as_object_mut()
            .ok_or_else(|| ConfigError::NotAMapping {
                key: key.to_string(),
                segment: segment.clone(),
            })?;
    }

    Ok(table.insert(last.clone(), value))
}
