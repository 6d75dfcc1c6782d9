//! Script content: the root document of an experience.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection names are keys of the root object; `meta` is reserved.
pub const META_KEY: &str = "meta";

/// A script document mapping collection names to ordered resources.
///
/// Content is treated as immutable once migrated and validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptContent(Map<String, Value>);

impl ScriptContent {
    /// Wraps an already-parsed root object.
    #[must_use]
    pub fn new(root: Map<String, Value>) -> Self {
        Self(root)
    }

    /// Converts a JSON value into script content.
    ///
    /// Returns `None` when the value is not an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self(root)),
            _ => None,
        }
    }

    /// Returns the underlying root object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the resources of a collection, or an empty slice.
    #[must_use]
    pub fn collection(&self, name: &str) -> &[Value] {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Iterates over `(collection name, resources)` pairs, skipping `meta`.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != META_KEY)
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Finds a resource by name within a collection.
    #[must_use]
    pub fn find(&self, collection: &str, name: &str) -> Option<&Map<String, Value>> {
        self.collection(collection)
            .iter()
            .filter_map(Value::as_object)
            .find(|resource| resource.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Returns true when a collection holds a resource with the given name.
    #[must_use]
    pub fn contains(&self, collection: &str, name: &str) -> bool {
        self.find(collection, name).is_some()
    }

    /// Returns the recorded schema version, if any.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.0
            .get(META_KEY)
            .and_then(|meta| meta.get("version"))
            .and_then(Value::as_u64)
    }
}

/// Reads a string field from a resource or parameter map.
#[must_use]
pub fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// Reads a boolean field, treating absence as false.
#[must_use]
pub fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}
