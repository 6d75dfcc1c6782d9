//! Triggers: an event spec, an optional condition and an action list.

use serde_json::{Map, Value};
use tripscript_core::error::EngineError;
use tripscript_core::script::str_field;

use crate::domain::action_node::ActionNode;

/// A trigger read from the `triggers` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    /// Scene the trigger is bound to, if any.
    pub scene: Option<String>,
    /// Event spec, including its `type`.
    pub event: Map<String, Value>,
    /// The `if` clause.
    pub condition: Option<Value>,
    pub actions: Vec<ActionNode>,
}

impl Trigger {
    /// Reads a trigger resource.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MalformedDocument` if the resource is not an
    /// object or has no name.
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let object = value
            .as_object()
            .ok_or_else(|| EngineError::MalformedDocument("trigger is not an object".to_owned()))?;
        let name = str_field(object, "name")
            .ok_or_else(|| EngineError::MalformedDocument("trigger has no name".to_owned()))?;
        Ok(Self {
            name: name.to_owned(),
            scene: str_field(object, "scene").map(str::to_owned),
            event: object
                .get("event")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            condition: object.get("if").filter(|clause| !clause.is_null()).cloned(),
            actions: ActionNode::list(object.get("actions")),
        })
    }

    /// The event spec's `type`, empty when missing.
    #[must_use]
    pub fn event_type(&self) -> &str {
        str_field(&self.event, "type").unwrap_or_default()
    }
}
