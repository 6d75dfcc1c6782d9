//! The shipped migrations, in ascending version order.

use crate::domain::MigrationDefinition;

mod button_cues;
mod condition_op_names;
mod consolidate_comparisons;
mod dedupe_resource_names;
mod media_urls;
mod messages_rm;
mod panels_legacy_rm;
mod relay_legacy_fields_rm;
mod rm_trigger_repeatable;
mod single_trigger_event;
mod structured_ifs;

/// Every migration, ordered by version.
#[must_use]
pub fn all() -> Vec<MigrationDefinition> {
    vec![
        structured_ifs::definition(),
        condition_op_names::definition(),
        messages_rm::definition(),
        single_trigger_event::definition(),
        rm_trigger_repeatable::definition(),
        relay_legacy_fields_rm::definition(),
        panels_legacy_rm::definition(),
        dedupe_resource_names::definition(),
        button_cues::definition(),
        media_urls::definition(),
        consolidate_comparisons::definition(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_ascend_without_gaps() {
        let versions: Vec<u32> = all().iter().map(|definition| definition.version).collect();
        assert_eq!(versions, (1..=11).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_migration_ships_a_fixture() {
        for definition in all() {
            assert!(!definition.fixtures.is_empty(), "{} has no fixtures", definition.name);
        }
    }
}
