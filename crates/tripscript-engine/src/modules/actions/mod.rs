//! Actions: turn validated parameters into instructions.

use tripscript_schema::{Category, ModuleDefinition, ModuleHooks, PropertySpec};

mod audio;
mod messaging;
mod scenes;
mod timing;
mod values;

/// Discriminant of the structural conditional node.
pub const CONDITIONAL: &str = "conditional";

/// Actions that suspend the rest of their trigger until a later time.
pub const WAIT_ACTIONS: [&str; 2] = ["wait", "wait_for_time"];

#[must_use]
pub fn definitions() -> Vec<ModuleDefinition> {
    vec![
        conditional(),
        values::set_value(),
        values::increment_value(),
        scenes::start_scene(),
        scenes::send_to_page(),
        audio::play_audio(),
        audio::pause_audio(),
        audio::resume_audio(),
        messaging::send_text(),
        messaging::send_audio(),
        messaging::send_image(),
        messaging::initiate_call(),
        messaging::signal_cue(),
        timing::wait(),
        timing::wait_for_time(),
        timing::log(),
    ]
}

// Schema only; the trigger evaluator resolves conditionals before dispatch.
fn conditional() -> ModuleDefinition {
    ModuleDefinition::new(
        CONDITIONAL,
        "Runs the first branch whose condition holds.",
        vec![
            ("if", PropertySpec::if_clause().required()),
            ("actions", PropertySpec::actions()),
            (
                "elseifs",
                PropertySpec::list(PropertySpec::object(vec![
                    ("if", PropertySpec::if_clause().required()),
                    ("actions", PropertySpec::actions()),
                ])),
            ),
            ("else", PropertySpec::actions()),
        ],
        ModuleHooks::Action { apply: None },
    )
}
