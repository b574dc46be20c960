//! Policy statements and the groups that bundle them.
//!
//! A [`Policy`] is a single named permission statement. Statements are
//! identified by name only: two policies with the same name compare equal,
//! hash identically and collapse to one entry in any set, regardless of
//! their actions or resources. A [`PolicyGroup`] aggregates policies and
//! previously built groups into a deduplicated, name-ordered set.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{GeneratorError, Result};

mod condition;
mod group;

pub use condition::Condition;
pub use group::{PolicyGroup, PolicyGroupBuilder};

/// Actions granted by [`Policy::s3_read`].
pub const S3_READ_ACTIONS: &[&str] = &[
    "s3:GetObject",
    "s3:GetObjectAcl",
    "s3:GetObjectVersion",
    "s3:ListBucket",
    "s3:ListObjectVersions",
    "s3:GetBucketLocation",
];

/// Actions granted by [`Policy::s3_write`].
pub const S3_WRITE_ACTIONS: &[&str] = &["s3:PutObject", "s3:PutObjectAcl"];

/// Actions granted by [`Policy::s3_delete`].
pub const S3_DELETE_ACTIONS: &[&str] = &["s3:DeleteObject"];

/// Name of the condition attached by [`Policy::s3_list_bucket_prefix`].
pub const LIST_BUCKET_PREFIX_CONDITION: &str = "RestrictListBucketToPrefix";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Allow" => Ok(Self::Allow),
            "Deny" => Ok(Self::Deny),
            other => Err(GeneratorError::invalid_argument(format!(
                "Effect must be \"Allow\" or \"Deny\", got {:?}",
                other
            ))),
        }
    }
}

/// A named access-grant statement.
///
/// Policies are immutable once built. Equality, hashing and ordering only
/// look at [`Policy::name`].
#[derive(Debug, Clone, Serialize)]
pub struct Policy {
    name: String,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<Condition>>,
}

impl Policy {
    /// Create a statement without conditions.
    ///
    /// # Errors
    /// Returns [`GeneratorError::InvalidArgument`] when `actions` is empty.
    pub fn new(
        name: impl Into<String>,
        effect: Effect,
        actions: Vec<String>,
        resources: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if actions.is_empty() {
            return Err(GeneratorError::invalid_argument(format!(
                "Policy {} must grant at least one action",
                name
            )));
        }
        Ok(Self::from_parts(name, effect, actions, resources))
    }

    fn from_parts(
        name: impl Into<String>,
        effect: Effect,
        actions: Vec<String>,
        resources: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            effect,
            actions,
            resources,
            conditions: None,
        }
    }

    fn canonical(name: impl Into<String>, actions: &[&str], resources: Vec<String>) -> Self {
        Self::from_parts(
            name,
            Effect::Allow,
            actions.iter().map(|a| (*a).to_string()).collect(),
            resources,
        )
    }

    /// Attach conditions, rendered in the given order.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Read grant: list and get permissions on the given resources.
    pub fn s3_read(name: impl Into<String>, resources: Vec<String>) -> Self {
        Self::canonical(name, S3_READ_ACTIONS, resources)
    }

    /// Write grant: put permissions on the given resources.
    pub fn s3_write(name: impl Into<String>, resources: Vec<String>) -> Self {
        Self::canonical(name, S3_WRITE_ACTIONS, resources)
    }

    /// Delete grant on the given resources.
    pub fn s3_delete(name: impl Into<String>, resources: Vec<String>) -> Self {
        Self::canonical(name, S3_DELETE_ACTIONS, resources)
    }

    /// Grant `s3:ListBucket` on one bucket, restricted to keys under `prefix`.
    ///
    /// Trailing separators on `prefix` are dropped before the restriction
    /// value `prefix/*` is built, so `team/` and `team` behave the same.
    pub fn s3_list_bucket_prefix(
        name: impl Into<String>,
        bucket: &str,
        prefix: &str,
    ) -> Self {
        let restriction = format!("{}/*", prefix.trim_end_matches('/'));
        // s3:ListBucket applies to the bucket ARN itself, not to a wildcarded account or region
        Self::canonical(
            name,
            &["s3:ListBucket"],
            vec![format!("arn:aws:s3:::{}", bucket)],
        )
        .with_conditions(vec![Condition::new(
            LIST_BUCKET_PREFIX_CONDITION,
            "StringLike",
            "s3:prefix",
            vec![restriction],
        )])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn conditions(&self) -> Option<&[Condition]> {
        self.conditions.as_deref()
    }
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Policy {}

impl Hash for Policy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Policy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Policy {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
