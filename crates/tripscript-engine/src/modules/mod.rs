//! The module catalog: every kind the registry knows about.

use serde_json::Value;
use tripscript_schema::{Category, ModuleDefinition, Properties, PropertySpec};

pub mod actions;
pub mod conditions;
pub mod events;
pub mod panels;
pub mod resources;

/// All module definitions, across categories.
#[must_use]
pub fn catalog() -> Vec<ModuleDefinition> {
    let mut modules = Vec::new();
    modules.extend(resources::definitions());
    modules.extend(actions::definitions());
    modules.extend(events::definitions());
    modules.extend(conditions::definitions());
    modules.extend(panels::definitions());
    modules
}

/// Properties merged into every member of a category.
#[must_use]
pub fn category_defaults() -> Vec<(Category, Properties)> {
    vec![
        (Category::Actions, vec![("id", PropertySpec::integer())]),
        (
            Category::Panels,
            vec![
                ("id", PropertySpec::integer()),
                (
                    "visible_if",
                    PropertySpec::if_clause().with_help("If present, the panel is only shown when this is true."),
                ),
            ],
        ),
    ]
}

/// Reads a string parameter, empty when absent.
pub(crate) fn text<'a>(params: &'a serde_json::Map<String, Value>, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or_default()
}
