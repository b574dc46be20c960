//! Output locations and document versions for a generation run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// CloudFormation template format version
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// IAM policy language version
pub const POLICY_DOCUMENT_VERSION: &str = "2012-10-17";

/// Generator configuration.
///
/// Every field has a default, so a partial document deserializes into a
/// complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Root directory under which documents are written
    pub output_dir: PathBuf,
    /// Subdirectory for human profile documents
    pub profiles_dir: String,
    /// Subdirectory for service stack documents
    pub service_stacks_dir: String,
    pub template_format_version: String,
    pub policy_document_version: String,
    pub assume_role_policy_document_version: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            profiles_dir: "personal-profiles".to_string(),
            service_stacks_dir: "service-user-stacks".to_string(),
            template_format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            policy_document_version: POLICY_DOCUMENT_VERSION.to_string(),
            assume_role_policy_document_version: POLICY_DOCUMENT_VERSION.to_string(),
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// `<output>/<profiles_dir>/profile-<name>.yml`
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(&self.profiles_dir)
            .join(format!("profile-{}.yml", name))
    }

    /// `<output>/<service_stacks_dir>/service-user-<name>.yml`
    pub fn service_stack_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(&self.service_stacks_dir)
            .join(format!("service-user-{}.yml", name))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
