//! Value actions.

use serde_json::{Map, Value};
use tripscript_core::context::ActionContext;
use tripscript_core::instruction::Instruction;
use tripscript_core::lookup::{as_number, number_value};
use tripscript_schema::registry::Params;
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

pub(super) fn set_value() -> ModuleDefinition {
    ModuleDefinition::new(
        "set_value",
        "Set a value to a literal or to another value.",
        vec![
            ("value_ref", PropertySpec::simple_attribute().required().with_help("Value to set.")),
            ("new_value_ref", PropertySpec::lookupable().required().with_help("Ref or literal to assign.")),
        ],
        ModuleHooks::Action {
            apply: Some(apply_set_value),
        },
    )
}

pub(super) fn increment_value() -> ModuleDefinition {
    ModuleDefinition::new(
        "increment_value",
        "Add to a numeric value.",
        vec![
            ("value_ref", PropertySpec::simple_attribute().required()),
            ("delta", PropertySpec::number().with_default(1)),
        ],
        ModuleHooks::Action {
            apply: Some(apply_increment_value),
        },
    )
}

fn apply_set_value(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let new_value = context.lookup_ref(params.get("new_value_ref").unwrap_or(&Value::Null));
    vec![assign(context, text(params, "value_ref"), new_value)]
}

fn apply_increment_value(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let value_ref = text(params, "value_ref");
    let current = context.evaluation.lookup_path(value_ref, context.event);
    let delta = params.get("delta").map_or(1.0, as_number);
    vec![assign(context, value_ref, number_value(as_number(&current) + delta))]
}

/// Writes `value` at `value_ref`. A ref whose first segment names a role
/// targets that role's player instead of the trip.
fn assign(context: &ActionContext<'_>, value_ref: &str, value: Value) -> Instruction {
    if let Some((role, rest)) = value_ref.split_once('.') {
        if context.script.contains("roles", role) {
            return Instruction::UpdatePlayerState {
                role_name: role.to_owned(),
                values: Map::from_iter([(rest.to_owned(), value)]),
            };
        }
    }
    Instruction::UpdateTripValues {
        values: Map::from_iter([(value_ref.to_owned(), value)]),
    }
}
