//! Brings a document up to the latest schema version.

use serde_json::{Map, Value};
use tracing::instrument;
use tripscript_core::error::EngineError;

use crate::domain::walk::apply_scope;
use crate::domain::{MediaLibrary, MigrationDefinition, MigrationState};
use crate::migrations;

/// Version a fully migrated document carries.
#[must_use]
pub fn latest_version() -> u32 {
    migrations::all().last().map_or(0, |definition| definition.version)
}

/// Runs one migration's transforms against `document`.
///
/// The whole-document transform runs first, then each scoped transform in
/// declaration order. `meta.version` is left alone.
pub fn apply_migration(definition: &MigrationDefinition, document: &mut Map<String, Value>, state: &mut MigrationState) {
    if let Some(transform) = definition.document {
        transform(document, state);
    }
    for (scope, transform) in &definition.transforms {
        apply_scope(document, *scope, *transform, state);
    }
}

fn recorded_version(document: &Map<String, Value>) -> Result<u32, EngineError> {
    let Some(version) = document.get("meta").and_then(|meta| meta.get("version")) else {
        return Ok(0);
    };
    version
        .as_u64()
        .and_then(|version| u32::try_from(version).ok())
        .ok_or_else(|| EngineError::MalformedDocument(format!("meta.version {version} is not a version number")))
}

fn record_version(document: &mut Map<String, Value>, version: u32) {
    let meta = document
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    if let Some(meta) = meta.as_object_mut() {
        meta.insert("version".to_owned(), Value::from(version));
    }
}

/// Migrates `document` from its recorded version to the latest, with no
/// media library. Legacy media paths that are not urls are dropped.
///
/// # Errors
///
/// As [`migrate_with_media`].
pub fn migrate(document: Value) -> Result<Value, EngineError> {
    migrate_with_media(document, &MediaLibrary::new())
}

/// Migrates `document` from its recorded version to the latest, resolving
/// legacy media paths against `media`.
///
/// # Errors
///
/// Returns [`EngineError::MalformedDocument`] if the document is not an
/// object, its version is unreadable, or it is newer than any migration.
#[instrument(skip_all, fields(media = media.len()))]
pub fn migrate_with_media(document: Value, media: &MediaLibrary) -> Result<Value, EngineError> {
    let Value::Object(mut document) = document else {
        return Err(EngineError::MalformedDocument("script content must be an object".to_owned()));
    };
    let from = recorded_version(&document)?;
    let latest = latest_version();
    if from > latest {
        return Err(EngineError::MalformedDocument(format!(
            "meta.version {from} is newer than the latest migration ({latest})"
        )));
    }

    let mut state = MigrationState::with_media(media.clone());
    for definition in migrations::all().iter().filter(|definition| definition.version > from) {
        apply_migration(definition, &mut document, &mut state);
        record_version(&mut document, definition.version);
        tracing::info!(version = definition.version, migration = definition.name, "applied migration");
    }
    Ok(Value::Object(document))
}
