//! Error types for policy composition and document generation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading definitions or generating documents.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A value was supplied in a shape the model refuses to coerce.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The catalog of policies, groups and identities is inconsistent.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// One or more human identity names break the naming convention.
    #[error("Identity names not compliant with naming convention: {}", names.join(", "))]
    NamingConvention {
        /// Every offending identity name, in ascending order.
        names: Vec<String>,
    },

    /// A template could not be located or rendered.
    #[error("Template error: {0}")]
    Template(String),

    /// A filesystem operation failed.
    #[error("Failed to {operation} '{}': {source}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
}

impl GeneratorError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Wrap an I/O error with the operation and path that produced it.
    pub fn file_system(
        operation: impl Into<String>,
        path: impl AsRef<Path>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeneratorError>;
