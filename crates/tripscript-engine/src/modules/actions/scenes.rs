//! Scene and page navigation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tripscript_core::context::ActionContext;
use tripscript_core::event::Event;
use tripscript_core::instruction::Instruction;
use tripscript_core::script::{flag, str_field};
use tripscript_schema::registry::Params;
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

pub(super) fn start_scene() -> ModuleDefinition {
    ModuleDefinition::new(
        "start_scene",
        "Make a scene current and show each role the scene's first page.",
        vec![("scene_name", PropertySpec::reference("scenes").required())],
        ModuleHooks::Action {
            apply: Some(apply_start_scene),
        },
    )
}

pub(super) fn send_to_page() -> ModuleDefinition {
    ModuleDefinition::new(
        "send_to_page",
        "Show a page to a role.",
        vec![
            ("role_name", PropertySpec::reference("roles").required()),
            ("page_name", PropertySpec::reference("pages").required()),
        ],
        ModuleHooks::Action {
            apply: Some(apply_send_to_page),
        },
    )
}

fn apply_start_scene(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let scene_name = text(params, "scene_name");
    let Some(scene) = context.script.find("scenes", scene_name) else {
        return vec![Instruction::error(format!(
            "Could not find scene named \"{scene_name}\"."
        ))];
    };
    if context.evaluation.current_scene_name() == Some(scene_name) || flag(scene, "global") {
        return Vec::new();
    }
    let mut first_pages: BTreeMap<String, String> = BTreeMap::new();
    for page in context.script.collection("pages").iter().filter_map(Value::as_object) {
        if str_field(page, "scene") != Some(scene_name) {
            continue;
        }
        if let (Some(role), Some(name)) = (str_field(page, "role"), str_field(page, "name")) {
            first_pages.entry(role.to_owned()).or_insert_with(|| name.to_owned());
        }
    }
    let mut state = context.evaluation.trip_state.clone();
    state.current_scene_name = Some(scene_name.to_owned());
    state.current_page_names_by_role.extend(first_pages);
    vec![
        Instruction::UpdateTripState { state },
        Instruction::EmitEvent {
            event: Event::new("scene_started").with("scene", scene_name),
        },
    ]
}

fn apply_send_to_page(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let role_name = text(params, "role_name");
    let page_name = text(params, "page_name");
    let Some(page) = context.script.find("pages", page_name) else {
        return vec![Instruction::error(format!("Could not find page named \"{page_name}\"."))];
    };
    if str_field(page, "role") != Some(role_name) {
        return vec![Instruction::error(format!(
            "Page \"{page_name}\" does not belong to role \"{role_name}\"."
        ))];
    }
    let mut state = context.evaluation.trip_state.clone();
    state
        .current_page_names_by_role
        .insert(role_name.to_owned(), page_name.to_owned());
    vec![
        Instruction::UpdateTripState { state },
        Instruction::UpdatePlayerFields {
            role_name: role_name.to_owned(),
            fields: Map::from_iter([
                ("acknowledged_page_name".to_owned(), Value::String(String::new())),
                ("acknowledged_page_at".to_owned(), Value::Null),
            ]),
        },
        Instruction::UpdateUi {
            role_name: role_name.to_owned(),
        },
    ]
}
