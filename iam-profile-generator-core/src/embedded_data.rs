//! Embedded document templates and the default catalog
//!
//! The CloudFormation templates and the default policy catalog are embedded
//! directly into the binary at compile time so that a plain
//! `iam-profile-generator generate` works without any files on disk.
//! Both can be overridden from the filesystem.

use rust_embed::RustEmbed;

use crate::errors::{GeneratorError, Result};

/// Embedded CloudFormation templates
#[derive(RustEmbed)]
#[folder = "resources/templates"]
#[include = "*.yml"]
pub struct EmbeddedTemplates;

/// Embedded default catalog of policies, groups and identities
#[derive(RustEmbed)]
#[folder = "resources/catalog"]
#[include = "*.toml"]
pub struct EmbeddedCatalog;

/// File name of the embedded default catalog
pub const DEFAULT_CATALOG: &str = "default_catalog.toml";

impl EmbeddedTemplates {
    /// Get a template by file name
    pub fn get_template_bytes(name: &str) -> Option<Vec<u8>> {
        Self::get(name).map(|file| file.data.to_vec())
    }

    /// Get a template by file name as text
    pub(crate) fn get_template(name: &str) -> Result<String> {
        let bytes = Self::get_template_bytes(name).ok_or_else(|| {
            GeneratorError::template(format!("Embedded template {} not found", name))
        })?;
        String::from_utf8(bytes).map_err(|e| {
            GeneratorError::template(format!("Embedded template {} is not UTF-8: {}", name, e))
        })
    }
}

impl EmbeddedCatalog {
    /// Text of the default catalog
    pub fn default_catalog() -> Result<String> {
        let file = Self::get(DEFAULT_CATALOG).ok_or_else(|| {
            GeneratorError::catalog(format!("Embedded catalog {} not found", DEFAULT_CATALOG))
        })?;
        String::from_utf8(file.data.to_vec()).map_err(|e| {
            GeneratorError::catalog(format!("Embedded catalog is not UTF-8: {}", e))
        })
    }
}
