//! Engine error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single problem found while checking a value against its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Property path, e.g. `triggers[2].event.scene`.
    pub path: String,
    /// Human-readable description naming the property.
    pub message: String,
}

impl FieldError {
    /// Creates a field error for `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Top-level engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Script content failed schema validation.
    #[error("schema validation failed with {} error(s): {}", .0.len(), summarize(.0))]
    SchemaValidation(Vec<FieldError>),

    /// No module is registered for a discriminant.
    #[error("no {category} module registered for \"{discriminant}\"")]
    DispatchNotFound {
        /// The registry category that was searched.
        category: &'static str,
        /// The discriminant value that failed to resolve.
        discriminant: String,
    },

    /// A migration fixture did not reproduce its declared output.
    #[error("migration {version} ({name}) fixture {index} did not reproduce its expected output")]
    MigrationFixtureMismatch {
        /// Version number of the migration.
        version: u32,
        /// Name of the migration.
        name: &'static str,
        /// Index of the failing fixture.
        index: usize,
    },

    /// A document could not be interpreted at all.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation_message_lists_every_error() {
        let err = EngineError::SchemaValidation(vec![
            FieldError::new("a", "Required param \"a\" not present."),
            FieldError::new("b", "Required param \"b\" not present."),
        ]);

        assert_eq!(
            err.to_string(),
            "schema validation failed with 2 error(s): Required param \"a\" not present. Required param \"b\" not present."
        );
    }

    #[test]
    fn test_dispatch_not_found_names_category_and_discriminant() {
        let err = EngineError::DispatchNotFound {
            category: "actions",
            discriminant: "teleport".to_owned(),
        };

        assert_eq!(
            err.to_string(),
            "no actions module registered for \"teleport\""
        );
    }
}
