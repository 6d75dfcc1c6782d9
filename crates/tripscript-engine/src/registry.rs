//! The process-wide module registry.

use std::sync::LazyLock;

use tripscript_schema::Registry;

use crate::modules;

static REGISTRY: LazyLock<Registry> =
    LazyLock::new(|| Registry::new(modules::catalog(), modules::category_defaults()));

/// Returns the registry built from the module catalog on first use.
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripscript_schema::Category;

    #[test]
    fn test_every_category_is_populated() {
        for category in Category::ALL {
            assert!(
                registry().modules(category).next().is_some(),
                "no modules in {category}"
            );
        }
    }

    #[test]
    fn test_conditional_is_registered_without_apply_hook() {
        let conditional = registry().lookup(Category::Actions, "conditional").unwrap();

        assert!(conditional.apply_hook().is_none());
    }

    #[test]
    fn test_every_other_action_has_an_apply_hook() {
        for action in registry().modules(Category::Actions) {
            if action.name != "conditional" {
                assert!(action.apply_hook().is_some(), "{} has no apply hook", action.name);
            }
        }
    }
}
