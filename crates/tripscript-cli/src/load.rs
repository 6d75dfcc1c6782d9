//! Reading JSON and YAML documents from disk.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Encoding of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file extension; JSON unless `.yaml`/`.yml`.
    #[must_use]
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Parses `text` as `format`.
///
/// # Errors
///
/// Returns `AppError::Json` or `AppError::Yaml` if the text does not parse
/// into `T`.
pub fn parse<T: DeserializeOwned>(text: &str, format: DocumentFormat) -> Result<T, AppError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

/// Reads and parses the document at `path`.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read, or a parse error.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read document");
    parse(&text, DocumentFormat::of(path))
}
