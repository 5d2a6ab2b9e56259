//! Minimal payload inspection.
//!
//! Payloads stay opaque: the store checks that the body is a single JSON
//! object and, for keyed kinds, reads one string field. Every other value
//! is skipped without being materialized.

use crate::error::{SnapshotError, SnapshotResult};
use crate::kind::SnapshotKind;
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;

/// Validates `raw` for `kind` and returns its storage key.
///
/// Returns `None` for status (singleton) and the `date`/`week` value for
/// daily/weekly reports.
///
/// # Errors
///
/// Returns [`SnapshotError::Validation`] if `raw` is not a JSON object, or
/// if a keyed kind lacks a non-empty string key field.
pub fn extract_key(kind: SnapshotKind, raw: &[u8]) -> SnapshotResult<Option<String>> {
    let mut deserializer = serde_json::Deserializer::from_slice(raw);
    let field = KeyField {
        name: kind.key_field(),
    }
    .deserialize(&mut deserializer)
    .and_then(|field| deserializer.end().map(|()| field))
    .map_err(|e| SnapshotError::validation(format!("{kind} payload is not a JSON object: {e}")))?;

    let Some(name) = kind.key_field() else {
        return Ok(None);
    };
    match field {
        Some(Value::String(key)) if !key.is_empty() => Ok(Some(key)),
        _ => Err(SnapshotError::validation(format!(
            "{kind} report missing {name}"
        ))),
    }
}

/// Pulls one field out of a JSON object, skipping the rest.
struct KeyField {
    name: Option<&'static str>,
}

impl<'de> DeserializeSeed<'de> for KeyField {
    type Value = Option<Value>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for KeyField {
    type Value = Option<Value>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut found = None;
        while let Some(key) = map.next_key::<String>()? {
            if Some(key.as_str()) == self.name {
                // Duplicate keys: the last occurrence wins.
                found = Some(map.next_value::<Value>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(found)
    }
}
