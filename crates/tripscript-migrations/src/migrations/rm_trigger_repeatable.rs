//! Folds `repeatable` and `active_if` into a wrapping conditional.
//!
//! A non-repeatable trigger records that it ran in a `counter_N` trip value
//! and tests it on the way in. Generated action ids start at 100000 so they
//! never collide with authored ids.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

const ID_BASE: u32 = 100_000;

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 5,
        name: "rm_trigger_repeatable",
        document: None,
        transforms: vec![(Scope::Collection("triggers"), fold_repeatable)],
        fixtures: vec![Fixture::new(
            json!({
                "triggers": [
                    {"name": "plain", "actions": [{"id": 1, "name": "signal_cue", "cue_name": "bell"}]},
                    {"name": "guarded", "active_if": {"op": "value_is_true", "ref": "lit"},
                     "actions": [{"id": 2, "name": "signal_cue", "cue_name": "bell"}]},
                    {"name": "once", "repeatable": false,
                     "actions": [{"id": 3, "name": "signal_cue", "cue_name": "bell"}]},
                    {"name": "guarded_once", "repeatable": false, "active_if": {"op": "value_is_true", "ref": "dark"},
                     "actions": [{"id": 4, "name": "signal_cue", "cue_name": "bell"}]}
                ]
            }),
            json!({
                "triggers": [
                    {"name": "plain", "actions": [{"id": 1, "name": "signal_cue", "cue_name": "bell"}]},
                    {"name": "guarded", "actions": [{
                        "id": 100_001, "name": "conditional",
                        "if": {"op": "value_is_true", "ref": "lit"},
                        "actions": [{"id": 2, "name": "signal_cue", "cue_name": "bell"}]
                    }]},
                    {"name": "once", "actions": [{
                        "id": 100_002, "name": "conditional",
                        "if": {"op": "not", "item": {"op": "value_is_true", "ref": "counter_2"}},
                        "actions": [
                            {"id": 100_003, "name": "set_value", "value_ref": "counter_2", "new_value_ref": "true"},
                            {"id": 3, "name": "signal_cue", "cue_name": "bell"}
                        ]
                    }]},
                    {"name": "guarded_once", "actions": [{
                        "id": 100_004, "name": "conditional",
                        "if": {"op": "and", "items": [
                            {"op": "not", "item": {"op": "value_is_true", "ref": "counter_4"}},
                            {"op": "value_is_true", "ref": "dark"}
                        ]},
                        "actions": [
                            {"id": 100_005, "name": "set_value", "value_ref": "counter_4", "new_value_ref": "true"},
                            {"id": 4, "name": "signal_cue", "cue_name": "bell"}
                        ]
                    }]}
                ]
            }),
        )],
    }
}

fn conditional(id: u32, clause: Value, actions: Vec<Value>) -> Value {
    json!({"id": ID_BASE + id, "name": "conditional", "if": clause, "actions": actions})
}

fn wrap_actions(repeatable: bool, active_if: Option<Value>, actions: Vec<Value>, state: &mut MigrationState) -> Vec<Value> {
    if repeatable {
        return match active_if {
            Some(clause) => vec![conditional(state.advance(1), clause, actions)],
            None => actions,
        };
    }
    let marker = state.advance(2);
    let counter_ref = format!("counter_{}", marker - 1);
    let not_yet_run = json!({"op": "not", "item": {"op": "value_is_true", "ref": counter_ref}});
    let clause = match active_if {
        Some(clause) => json!({"op": "and", "items": [not_yet_run, clause]}),
        None => not_yet_run,
    };
    let mut guarded = vec![json!({
        "id": ID_BASE + marker,
        "name": "set_value",
        "value_ref": counter_ref,
        "new_value_ref": "true"
    })];
    guarded.extend(actions);
    vec![conditional(marker - 1, clause, guarded)]
}

fn fold_repeatable(trigger: &mut Value, state: &mut MigrationState) -> TransformOutcome {
    let Some(object) = trigger.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    let repeatable = object.remove("repeatable").as_ref().and_then(Value::as_bool) != Some(false);
    let active_if = object.remove("active_if").filter(|clause| !clause.is_null());
    let actions = match object.remove("actions") {
        Some(Value::Array(actions)) => actions,
        _ => Vec::new(),
    };
    let wrapped = wrap_actions(repeatable, active_if, actions, state);
    object.insert("actions".to_owned(), Value::Array(wrapped));
    TransformOutcome::Keep
}

