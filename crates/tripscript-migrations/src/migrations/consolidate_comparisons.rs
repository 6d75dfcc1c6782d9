//! Folds `value_equals` and `value_contains` into `value_compare` with a
//! `comparison_method`.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 11,
        name: "consolidate_comparison_conditions",
        document: None,
        transforms: vec![(Scope::IfClauses, consolidate)],
        fixtures: vec![Fixture::new(
            json!({
                "triggers": [
                    {"name": "a", "if": {"op": "value_equals", "ref1": "decision_01_choice", "ref2": "\"monkey\""}},
                    {"name": "b", "actions": [{"name": "conditional", "actions": [],
                        "if": {"op": "value_contains", "part_ref": "\"salamander\"", "string_ref": "decision_01_choice"}}]},
                    {"name": "c", "if": {"op": "or", "items": [
                        {"op": "value_equals", "ref1": "decision_01_choice", "ref2": "\"monkeys\""},
                        {"op": "value_contains", "part_ref": "\"salamanders\"", "string_ref": "decision_01_choice"}
                    ]}}
                ]
            }),
            json!({
                "triggers": [
                    {"name": "a", "if": {"op": "value_compare", "comparison_method": "equals",
                        "ref1": "decision_01_choice", "ref2": "\"monkey\""}},
                    {"name": "b", "actions": [{"name": "conditional", "actions": [],
                        "if": {"op": "value_compare", "comparison_method": "contains",
                            "ref2": "\"salamander\"", "ref1": "decision_01_choice"}}]},
                    {"name": "c", "if": {"op": "or", "items": [
                        {"op": "value_compare", "comparison_method": "equals",
                            "ref1": "decision_01_choice", "ref2": "\"monkeys\""},
                        {"op": "value_compare", "comparison_method": "contains",
                            "ref2": "\"salamanders\"", "ref1": "decision_01_choice"}
                    ]}}
                ]
            }),
        )],
    }
}

fn consolidate_tree(clause: &mut Value) {
    let Some(object) = clause.as_object_mut() else {
        return;
    };
    match object.get("op").and_then(Value::as_str) {
        Some("value_equals") => {
            object.insert("op".to_owned(), Value::from("value_compare"));
            object.insert("comparison_method".to_owned(), Value::from("equals"));
        }
        Some("value_contains") => {
            object.insert("op".to_owned(), Value::from("value_compare"));
            object.insert("comparison_method".to_owned(), Value::from("contains"));
            for (from, to) in [("string_ref", "ref1"), ("part_ref", "ref2")] {
                if let Some(value) = object.remove(from) {
                    object.insert(to.to_owned(), value);
                }
            }
        }
        _ => {}
    }
    if let Some(item) = object.get_mut("item") {
        consolidate_tree(item);
    }
    if let Some(Value::Array(items)) = object.get_mut("items") {
        items.iter_mut().for_each(consolidate_tree);
    }
}

fn consolidate(clause: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    consolidate_tree(clause);
    TransformOutcome::Keep
}
