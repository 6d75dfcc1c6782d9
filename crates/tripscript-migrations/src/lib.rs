//! Tripscript Migrations — evolves saved scripts across schema versions.
//!
//! A fixed, ascending list of migration definitions runs from a document's
//! recorded `meta.version` up to the latest. Each definition ships fixtures
//! that pin exactly what it changes.

pub mod application;
pub mod domain;
pub mod migrations;

pub use application::fixtures::{check_all_fixtures, check_fixtures};
pub use application::pipeline::{apply_migration, latest_version, migrate, migrate_with_media};
pub use domain::{Fixture, MediaLibrary, MigrationDefinition, MigrationState, Scope, TransformOutcome};
