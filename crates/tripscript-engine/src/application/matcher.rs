//! Matching runtime events against trigger event specs.

use tripscript_core::context::ActionContext;
use tripscript_core::event::Event;
use tripscript_core::script::str_field;
use tripscript_schema::registry::Params;
use tripscript_schema::{Category, ModuleDefinition, Registry};

/// Pure predicate over (event module, spec, event, context).
#[derive(Debug, Clone, Copy)]
pub struct EventMatcher<'r> {
    registry: &'r Registry,
}

impl<'r> EventMatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Whether `event` satisfies `spec` under the event module `module`.
    /// A spec whose `type` differs from the event's never matches.
    #[must_use]
    pub fn matches(&self, module: &ModuleDefinition, spec: &Params, event: &Event, context: &ActionContext<'_>) -> bool {
        if str_field(spec, "type") != Some(event.kind.as_str()) || module.name != event.kind {
            return false;
        }
        module
            .match_hook()
            .is_some_and(|matches| matches(spec, event, context))
    }

    /// Resolves the spec's event module and matches. Unknown types never match.
    #[must_use]
    pub fn matches_spec(&self, spec: &Params, event: &Event, context: &ActionContext<'_>) -> bool {
        let event_type = str_field(spec, "type").unwrap_or_default();
        self.registry
            .lookup(Category::Events, event_type)
            .is_ok_and(|module| self.matches(module, spec, event, context))
    }
}
