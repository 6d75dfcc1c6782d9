//! Action nodes: plain action calls mixed with conditionals.
//!
//! Parsing never fails. A node that cannot be read becomes an action call
//! with an empty name, which the dispatcher degrades to an error log.

use serde_json::{Map, Value};

use crate::modules::actions::CONDITIONAL;

/// One action invocation: the module name and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    /// Action module name.
    pub name: String,
    /// Parameters, excluding `name`.
    pub params: Map<String, Value>,
}

/// A guarded branch of a conditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// The `if` clause. Absent means always true.
    pub condition: Option<Value>,
    /// Actions run when the clause holds.
    pub actions: Vec<ActionNode>,
}

/// An entry of a trigger's action list.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionNode {
    /// Dispatched to an action module.
    Action(ActionCall),
    /// Selects at most one branch; never dispatched itself.
    Conditional {
        /// Primary branch.
        primary: Branch,
        /// Tried in declaration order when the primary branch fails.
        elseifs: Vec<Branch>,
        /// Runs when no branch holds.
        otherwise: Vec<ActionNode>,
    },
}

impl ActionNode {
    /// Reads one node.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Action(ActionCall {
                name: String::new(),
                params: Map::new(),
            });
        };
        let name = object.get("name").and_then(Value::as_str).unwrap_or_default();
        if name == CONDITIONAL {
            return Self::Conditional {
                primary: Branch::from_object(object),
                elseifs: object
                    .get("elseifs")
                    .and_then(Value::as_array)
                    .map(|branches| {
                        branches
                            .iter()
                            .filter_map(Value::as_object)
                            .map(Branch::from_object)
                            .collect()
                    })
                    .unwrap_or_default(),
                otherwise: Self::list(object.get("else")),
            };
        }
        let mut params = object.clone();
        params.remove("name");
        Self::Action(ActionCall {
            name: name.to_owned(),
            params,
        })
    }

    /// Reads an action list; anything but an array is empty.
    #[must_use]
    pub fn list(value: Option<&Value>) -> Vec<Self> {
        value
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

impl Branch {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            condition: object.get("if").filter(|clause| !clause.is_null()).cloned(),
            actions: ActionNode::list(object.get("actions")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_params_exclude_name() {
        let node = ActionNode::from_value(&json!({"name": "signal_cue", "cue_name": "bell", "id": 3}));

        match node {
            ActionNode::Action(call) => {
                assert_eq!(call.name, "signal_cue");
                assert_eq!(call.params.len(), 2);
                assert!(!call.params.contains_key("name"));
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn test_conditional_reads_every_branch() {
        let node = ActionNode::from_value(&json!({
            "name": "conditional",
            "if": {"op": "value_is_true", "ref": "a"},
            "actions": [{"name": "signal_cue", "cue_name": "one"}],
            "elseifs": [
                {"if": {"op": "value_is_true", "ref": "b"}, "actions": [{"name": "signal_cue", "cue_name": "two"}]}
            ],
            "else": [{"name": "signal_cue", "cue_name": "three"}]
        }));

        match node {
            ActionNode::Conditional {
                primary,
                elseifs,
                otherwise,
            } => {
                assert_eq!(primary.condition, Some(json!({"op": "value_is_true", "ref": "a"})));
                assert_eq!(primary.actions.len(), 1);
                assert_eq!(elseifs.len(), 1);
                assert_eq!(otherwise.len(), 1);
            }
            other => panic!("expected Conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_node_becomes_unnamed_action() {
        match ActionNode::from_value(&json!("signal_cue")) {
            ActionNode::Action(call) => assert!(call.name.is_empty()),
            other => panic!("expected Action, got {other:?}"),
        }
    }
}
