//! Module registry: `(category, discriminant) → module definition`.
//!
//! Built once from a static table and never mutated afterwards. Each module
//! is a tagged variant declaring exactly the capability hooks it implements.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tripscript_core::condition::ConditionScope;
use tripscript_core::context::ActionContext;
use tripscript_core::error::EngineError;
use tripscript_core::event::Event;
use tripscript_core::instruction::Instruction;
use tripscript_core::script::ScriptContent;

use crate::property::{Properties, PropertySpec};

/// Parameter map handed to module hooks.
pub type Params = Map<String, Value>;

/// Turns validated action parameters into instructions.
pub type ApplyHook = fn(&Params, &ActionContext<'_>) -> Vec<Instruction>;
/// Decides whether a runtime event satisfies an event spec.
pub type MatchHook = fn(&Params, &Event, &ActionContext<'_>) -> bool;
/// Evaluates a condition node.
pub type EvalHook = fn(&Params, &dyn ConditionScope) -> Result<bool, EngineError>;
/// Renders a display title.
pub type TitleHook = fn(&Params, &ScriptContent) -> String;
/// Extra checks returning warning messages.
pub type ValidateHook = fn(&Params, &ScriptContent) -> Vec<String>;
/// Lists `collection.name` resources this resource claims as parents.
pub type ParentClaimsHook = fn(&Params, &Registry) -> Vec<String>;

/// Registry categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Resource types, keyed by collection name.
    Resources,
    /// Actions, keyed by `name`.
    Actions,
    /// Events, keyed by `type`.
    Events,
    /// Conditions, keyed by `op`.
    Conditions,
    /// Page panels, keyed by `type`.
    Panels,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 5] = [
        Category::Resources,
        Category::Actions,
        Category::Events,
        Category::Conditions,
        Category::Panels,
    ];

    /// Category name as used in messages and the reference dump.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Resources => "resources",
            Category::Actions => "actions",
            Category::Events => "events",
            Category::Conditions => "conditions",
            Category::Panels => "panels",
        }
    }

    /// Field that selects a member of this category inside a component.
    #[must_use]
    pub fn discriminant(self) -> &'static str {
        match self {
            Category::Resources => "collection",
            Category::Actions => "name",
            Category::Events | Category::Panels => "type",
            Category::Conditions => "op",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific capability hooks.
#[derive(Debug, Clone, Copy)]
pub enum ModuleHooks {
    /// An action. `apply` is absent only for structural pseudo-actions.
    Action {
        /// Produces instructions.
        apply: Option<ApplyHook>,
    },
    /// An event kind.
    Event {
        /// Matches runtime events.
        matches: MatchHook,
        /// Spec parameter naming a parent resource, with its collection.
        parent_param: Option<(&'static str, &'static str)>,
    },
    /// A condition op.
    Condition {
        /// Evaluates the node.
        eval: EvalHook,
    },
    /// A page panel.
    Panel,
    /// A resource type.
    Resource {
        /// Ownership claims on other resources.
        parent_claims: Option<ParentClaimsHook>,
    },
}

/// One kind within a category.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    /// Discriminant value selecting this module.
    pub name: &'static str,
    /// Authoring help.
    pub help: &'static str,
    /// Own properties, excluding category defaults.
    pub properties: Properties,
    /// Category-specific hooks.
    pub hooks: ModuleHooks,
    /// Optional display title.
    pub title: Option<TitleHook>,
    /// Optional extra validation.
    pub validate: Option<ValidateHook>,
}

impl ModuleDefinition {
    /// Creates a module with no optional hooks.
    #[must_use]
    pub fn new(name: &'static str, help: &'static str, properties: Properties, hooks: ModuleHooks) -> Self {
        Self {
            name,
            help,
            properties,
            hooks,
            title: None,
            validate: None,
        }
    }

    /// Attaches a title hook.
    #[must_use]
    pub fn with_title(mut self, title: TitleHook) -> Self {
        self.title = Some(title);
        self
    }

    /// Attaches a validate hook.
    #[must_use]
    pub fn with_validate(mut self, validate: ValidateHook) -> Self {
        self.validate = Some(validate);
        self
    }

    /// The category implied by the hook variant.
    #[must_use]
    pub fn category(&self) -> Category {
        match self.hooks {
            ModuleHooks::Action { .. } => Category::Actions,
            ModuleHooks::Event { .. } => Category::Events,
            ModuleHooks::Condition { .. } => Category::Conditions,
            ModuleHooks::Panel => Category::Panels,
            ModuleHooks::Resource { .. } => Category::Resources,
        }
    }

    #[must_use]
    pub fn apply_hook(&self) -> Option<ApplyHook> {
        match self.hooks {
            ModuleHooks::Action { apply } => apply,
            _ => None,
        }
    }

    #[must_use]
    pub fn match_hook(&self) -> Option<MatchHook> {
        match self.hooks {
            ModuleHooks::Event { matches, .. } => Some(matches),
            _ => None,
        }
    }

    #[must_use]
    pub fn eval_hook(&self) -> Option<EvalHook> {
        match self.hooks {
            ModuleHooks::Condition { eval } => Some(eval),
            _ => None,
        }
    }

    #[must_use]
    pub fn parent_claims_hook(&self) -> Option<ParentClaimsHook> {
        match self.hooks {
            ModuleHooks::Resource { parent_claims } => parent_claims,
            _ => None,
        }
    }

    /// Spec parameter of an event naming its parent resource.
    #[must_use]
    pub fn parent_param(&self) -> Option<(&'static str, &'static str)> {
        match self.hooks {
            ModuleHooks::Event { parent_param, .. } => parent_param,
            _ => None,
        }
    }

    /// Looks up one of the module's own properties.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, spec)| spec)
    }
}

/// The immutable table of modules.
#[derive(Debug, Default)]
pub struct Registry {
    modules: BTreeMap<Category, BTreeMap<&'static str, ModuleDefinition>>,
    defaults: BTreeMap<Category, Properties>,
}

impl Registry {
    /// Builds a registry from module definitions and per-category default
    /// properties. Later definitions with a duplicate discriminant are
    /// ignored with a warning.
    #[must_use]
    pub fn new(
        modules: impl IntoIterator<Item = ModuleDefinition>,
        defaults: impl IntoIterator<Item = (Category, Properties)>,
    ) -> Self {
        let mut registry = Self {
            modules: BTreeMap::new(),
            defaults: defaults.into_iter().collect(),
        };
        for module in modules {
            let members = registry.modules.entry(module.category()).or_default();
            if members.contains_key(module.name) {
                tracing::warn!(
                    category = %module.category(),
                    name = module.name,
                    "duplicate module definition ignored"
                );
                continue;
            }
            members.insert(module.name, module);
        }
        registry
    }

    /// Resolves a module by category and discriminant.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DispatchNotFound` if nothing is registered.
    pub fn lookup(&self, category: Category, discriminant: &str) -> Result<&ModuleDefinition, EngineError> {
        self.modules
            .get(&category)
            .and_then(|members| members.get(discriminant))
            .ok_or_else(|| EngineError::DispatchNotFound {
                category: category.as_str(),
                discriminant: discriminant.to_owned(),
            })
    }

    /// Members of a category in name order.
    pub fn modules(&self, category: Category) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.get(&category).into_iter().flat_map(BTreeMap::values)
    }

    /// Properties every member of `category` implicitly gains.
    #[must_use]
    pub fn default_properties(&self, category: Category) -> &[(&'static str, PropertySpec)] {
        self.defaults.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Category defaults followed by the module's own properties.
    #[must_use]
    pub fn member_properties(&self, module: &ModuleDefinition) -> Properties {
        let mut properties: Properties = self.default_properties(module.category()).to_vec();
        properties.extend(module.properties.iter().cloned());
        properties
    }

    /// Full property set of a component: its discriminant, then the
    /// member properties.
    #[must_use]
    pub fn component_properties(&self, module: &ModuleDefinition) -> Properties {
        let discriminant = module.category().discriminant();
        let mut properties: Properties = vec![(discriminant, PropertySpec::string().required())];
        properties.extend(self.member_properties(module));
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_apply(_: &Params, _: &ActionContext<'_>) -> Vec<Instruction> {
        Vec::new()
    }

    fn registry() -> Registry {
        Registry::new(
            vec![
                ModuleDefinition::new(
                    "ring_bell",
                    "Rings a bell.",
                    vec![("volume", PropertySpec::number())],
                    ModuleHooks::Action {
                        apply: Some(noop_apply),
                    },
                ),
                ModuleDefinition::new("text", "Shows text.", Vec::new(), ModuleHooks::Panel),
            ],
            vec![(Category::Panels, vec![("visible_if", PropertySpec::if_clause())])],
        )
    }

    #[test]
    fn test_lookup_resolves_registered_module() {
        let registry = registry();

        let module = registry.lookup(Category::Actions, "ring_bell").unwrap();

        assert_eq!(module.name, "ring_bell");
        assert!(module.apply_hook().is_some());
        assert!(module.match_hook().is_none());
    }

    #[test]
    fn test_lookup_of_unknown_discriminant_is_not_found() {
        match registry().lookup(Category::Events, "ring_bell") {
            Err(EngineError::DispatchNotFound { category, discriminant }) => {
                assert_eq!(category, "events");
                assert_eq!(discriminant, "ring_bell");
            }
            other => panic!("expected DispatchNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_component_properties_merge_category_defaults() {
        let registry = registry();
        let panel = registry.lookup(Category::Panels, "text").unwrap();

        let names: Vec<&str> = registry
            .component_properties(panel)
            .iter()
            .map(|(name, _)| *name)
            .collect();

        assert_eq!(names, vec!["type", "visible_if"]);
    }
}
