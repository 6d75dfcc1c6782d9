//! Renames legacy condition ops to their `value_*` names.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 2,
        name: "condition_op_names",
        document: None,
        transforms: vec![(Scope::IfClauses, rename)],
        fixtures: vec![Fixture::new(
            json!({
                "triggers": [{
                    "name": "t",
                    "if": {"op": "or", "items": [
                        {"op": "istrue", "ref": "a"},
                        {"op": "not", "item": {"op": "matches", "string_ref": "b", "regex_ref": "\"x\""}}
                    ]},
                    "actions": [{"name": "conditional", "if": {"op": "equals", "ref1": "c", "ref2": "d"}, "actions": []}]
                }],
                "pages": [{"name": "p", "panels": [
                    {"type": "text", "visible_if": {"op": "contains", "string_ref": "e", "part_ref": "f"}}
                ]}]
            }),
            json!({
                "triggers": [{
                    "name": "t",
                    "if": {"op": "or", "items": [
                        {"op": "value_is_true", "ref": "a"},
                        {"op": "not", "item": {"op": "value_matches", "string_ref": "b", "regex_ref": "\"x\""}}
                    ]},
                    "actions": [{"name": "conditional", "if": {"op": "value_equals", "ref1": "c", "ref2": "d"}, "actions": []}]
                }],
                "pages": [{"name": "p", "panels": [
                    {"type": "text", "visible_if": {"op": "value_contains", "string_ref": "e", "part_ref": "f"}}
                ]}]
            }),
        )],
    }
}

fn renamed(op: &str) -> Option<&'static str> {
    match op {
        "istrue" => Some("value_is_true"),
        "equals" => Some("value_equals"),
        "contains" => Some("value_contains"),
        "matches" => Some("value_matches"),
        _ => None,
    }
}

fn rename_tree(clause: &mut Value) {
    let Some(object) = clause.as_object_mut() else {
        return;
    };
    if let Some(new_op) = object.get("op").and_then(Value::as_str).and_then(renamed) {
        object.insert("op".to_owned(), Value::from(new_op));
    }
    if let Some(item) = object.get_mut("item") {
        rename_tree(item);
    }
    if let Some(Value::Array(items)) = object.get_mut("items") {
        items.iter_mut().for_each(rename_tree);
    }
}

fn rename(clause: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    rename_tree(clause);
    TransformOutcome::Keep
}
