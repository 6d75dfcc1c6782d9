//! Runtime events delivered to the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tagged runtime event, serialized as `{"type": "...", ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, matched against event modules by discriminant.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining event fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Adds a payload field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_owned(), value.into());
        self
    }

    /// Returns a payload field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Returns a payload field when it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Returns the event as a single JSON object, type included.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.payload.clone();
        object.insert("type".to_owned(), Value::String(self.kind.clone()));
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_deserializes_type_and_flattens_payload() {
        let event: Event =
            serde_json::from_value(json!({"type": "scene_started", "scene": "intro"})).unwrap();

        assert_eq!(event.kind, "scene_started");
        assert_eq!(event.get_str("scene"), Some("intro"));
        assert!(event.get("type").is_none());
    }

    #[test]
    fn test_to_value_includes_type() {
        let event = Event::new("cue_signaled").with("cue", "bell");

        assert_eq!(event.to_value(), json!({"type": "cue_signaled", "cue": "bell"}));
    }
}
