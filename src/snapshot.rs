// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known server state of a device.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Cached copy of the document the API last returned for one device.
///
/// The snapshot does not enforce a schema. Device proxies read the keys they
/// know about through the typed `require_*` helpers, which report a
/// [`SchemaError`] naming the dotted key path when a key is missing or holds
/// the wrong JSON type.
///
/// # Examples
///
/// ```
/// use petsafe_lib::DeviceSnapshot;
/// use serde_json::json;
///
/// let snapshot = DeviceSnapshot::from_value(json!({
///     "thing_name": "feeder-1",
///     "settings": { "slow_feed": true }
/// }))?;
///
/// assert_eq!(snapshot.require_str(&["thing_name"])?, "feeder-1");
/// assert!(snapshot.require_bool(&["settings", "slow_feed"])?);
/// # Ok::<(), petsafe_lib::error::SchemaError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSnapshot(Map<String, Value>);

impl DeviceSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON document, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`] for any other JSON type.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SchemaError::NotAnObject(json_type(&other))),
        }
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the snapshot, returning it as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Looks up a value by key path, descending through nested objects.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.as_object()?.get(*key))
    }

    /// Looks up a value that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingKey`] if any segment of the path is
    /// absent.
    pub fn require(&self, path: &[&str]) -> Result<&Value, SchemaError> {
        self.get(path)
            .ok_or_else(|| SchemaError::MissingKey(dotted(path)))
    }

    /// Reads a required boolean.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the key is missing or not a boolean.
    pub fn require_bool(&self, path: &[&str]) -> Result<bool, SchemaError> {
        self.require(path)?
            .as_bool()
            .ok_or_else(|| wrong_type(path, "boolean"))
    }

    /// Reads a required string.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the key is missing or not a string.
    pub fn require_str(&self, path: &[&str]) -> Result<&str, SchemaError> {
        self.require(path)?
            .as_str()
            .ok_or_else(|| wrong_type(path, "string"))
    }

    /// Reads a required integer.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the key is missing or not an integer.
    pub fn require_i64(&self, path: &[&str]) -> Result<i64, SchemaError> {
        self.require(path)?
            .as_i64()
            .ok_or_else(|| wrong_type(path, "integer"))
    }

    /// Checks that a value could be written under `parent` without
    /// clobbering a non-object.
    ///
    /// Missing intermediate objects are fine, they are created on write.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongType`] if a segment of `parent` exists but
    /// is not an object.
    pub fn check_writable(&self, parent: &[&str]) -> Result<(), SchemaError> {
        let mut current = &self.0;
        for (depth, key) in parent.iter().enumerate() {
            match current.get(*key) {
                None => return Ok(()),
                Some(Value::Object(map)) => current = map,
                Some(_) => return Err(wrong_type(&parent[..=depth], "object")),
            }
        }
        Ok(())
    }

    /// Writes exactly one key under `parent`, leaving every other key as is.
    ///
    /// An empty `parent` writes at the top level. Missing intermediate
    /// objects are created.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongType`] if a segment of `parent` exists but
    /// is not an object. The snapshot is unchanged in that case.
    pub fn merge_key(
        &mut self,
        parent: &[&str],
        key: &str,
        value: Value,
    ) -> Result<(), SchemaError> {
        self.check_writable(parent)?;

        let mut current = &mut self.0;
        for segment in parent {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => return Err(wrong_type(parent, "object")),
            };
        }
        current.insert(key.to_string(), value);
        Ok(())
    }

    /// Formats the snapshot as indented JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl TryFrom<Value> for DeviceSnapshot {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl fmt::Display for DeviceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

pub(crate) fn dotted(path: &[&str]) -> String {
    path.join(".")
}

pub(crate) fn wrong_type(path: &[&str], expected: &'static str) -> SchemaError {
    SchemaError::WrongType {
        key: dotted(path),
        expected,
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
