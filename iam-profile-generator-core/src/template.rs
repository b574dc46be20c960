//! Placeholder substitution into document templates.
//!
//! Templates are plain text with `{Name}` placeholders. Substitution is a
//! narrow function of (template, ordered parameters): every parameter with a
//! non-empty value replaces all occurrences of its placeholder, in parameter
//! order. No escaping or type coercion is applied.

use std::path::Path;

use crate::embedded_data::EmbeddedTemplates;
use crate::errors::{GeneratorError, Result};
use crate::providers::FileSystemProvider;

/// File name of the per-identity profile template
pub const PROFILE_TEMPLATE: &str = "devserver_profile_template.yml";

/// File name of the single policy document template
pub const POLICY_TEMPLATE: &str = "policy_template.yml";

/// File name of the service identity stack template
pub const SERVICE_USER_TEMPLATE: &str = "service_user_template.yml";

/// Ordered key/value pairs fed into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, keeping its original position when it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Placeholder token for a parameter name, e.g. `{RoleName}`.
pub fn placeholder(key: &str) -> String {
    format!("{{{}}}", key)
}

/// Replace every `{Key}` placeholder whose parameter has a non-empty value.
pub fn substitute(template: &str, parameters: &Parameters) -> String {
    parameters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&placeholder(key), value)
        })
}

/// The three document templates used by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub profile: String,
    pub policy: String,
    pub service_user: String,
}

impl Templates {
    /// Templates compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            profile: EmbeddedTemplates::get_template(PROFILE_TEMPLATE)?,
            policy: EmbeddedTemplates::get_template(POLICY_TEMPLATE)?,
            service_user: EmbeddedTemplates::get_template(SERVICE_USER_TEMPLATE)?,
        })
    }

    /// Templates read from `dir`, which must contain all three files.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !FileSystemProvider::file_exists(dir)? {
            return Err(GeneratorError::template(format!(
                "Template directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self {
            profile: FileSystemProvider::read_file(dir.join(PROFILE_TEMPLATE))?,
            policy: FileSystemProvider::read_file(dir.join(POLICY_TEMPLATE))?,
            service_user: FileSystemProvider::read_file(dir.join(SERVICE_USER_TEMPLATE))?,
        })
    }

    /// Load from `dir` when given, otherwise fall back to the embedded set.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => {
                log::info!("Loading templates from {}", dir.display());
                Self::from_dir(dir)
            }
            None => Self::embedded(),
        }
    }
}
