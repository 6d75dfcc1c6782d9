//! Conformance check for migration fixtures.

use serde_json::Value;
use tripscript_core::error::EngineError;

use crate::application::pipeline::apply_migration;
use crate::domain::{MigrationDefinition, MigrationState};
use crate::migrations;

/// Runs exactly `definition`'s transforms over each fixture's `before` and
/// compares the result to `after`.
///
/// # Errors
///
/// Returns [`EngineError::MigrationFixtureMismatch`] for the first fixture
/// that does not reproduce its `after`.
pub fn check_fixtures(definition: &MigrationDefinition) -> Result<(), EngineError> {
    for (index, fixture) in definition.fixtures.iter().enumerate() {
        let mismatch = || EngineError::MigrationFixtureMismatch {
            version: definition.version,
            name: definition.name,
            index,
        };
        let Value::Object(mut document) = fixture.before.clone() else {
            return Err(mismatch());
        };
        apply_migration(definition, &mut document, &mut MigrationState::with_media(fixture.media.clone()));
        if Value::Object(document) != fixture.after {
            return Err(mismatch());
        }
    }
    Ok(())
}

/// Checks the fixtures of every shipped migration.
///
/// # Errors
///
/// Returns the first [`EngineError::MigrationFixtureMismatch`] found.
pub fn check_all_fixtures() -> Result<(), EngineError> {
    migrations::all().iter().try_for_each(check_fixtures)
}
