//! Tripscript CLI — error types and exit codes.

use std::path::PathBuf;

use thiserror::Error;
use tripscript_core::error::EngineError;

/// Everything that can stop a CLI command.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable or flag is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The engine rejected the content.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A file could not be read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A document was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A document was not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AppError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Engine(EngineError::SchemaValidation(_)) => 2,
            AppError::Engine(EngineError::MigrationFixtureMismatch { .. } | EngineError::MalformedDocument(_)) => 3,
            AppError::Config(_) => 4,
            AppError::Engine(EngineError::DispatchNotFound { .. })
            | AppError::Io { .. }
            | AppError::Json(_)
            | AppError::Yaml(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripscript_core::error::FieldError;

    #[test]
    fn test_schema_validation_exits_with_2() {
        let err = AppError::from(EngineError::SchemaValidation(vec![FieldError::new("scenes[0]", "bad")]));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_migration_failures_exit_with_3() {
        let mismatch = AppError::from(EngineError::MigrationFixtureMismatch {
            version: 4,
            name: "single_trigger_event",
            index: 0,
        });
        let malformed = AppError::from(EngineError::MalformedDocument("not an object".to_owned()));

        assert_eq!(mismatch.exit_code(), 3);
        assert_eq!(malformed.exit_code(), 3);
    }

    #[test]
    fn test_config_exits_with_4() {
        assert_eq!(AppError::Config("bad timezone".to_owned()).exit_code(), 4);
    }

    #[test]
    fn test_io_and_parse_exit_with_1() {
        let io = AppError::Io {
            path: PathBuf::from("missing.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let json = AppError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());

        assert_eq!(io.exit_code(), 1);
        assert_eq!(json.exit_code(), 1);
        assert_eq!(io.to_string(), "cannot access missing.yaml: gone");
    }
}
