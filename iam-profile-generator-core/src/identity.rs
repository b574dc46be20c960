//! Human and service identities and the naming convention they follow.

use std::fmt;
use std::sync::Arc;

use log::error;
use regex::Regex;
use serde::Serialize;

use crate::errors::{GeneratorError, Result};
use crate::policy::PolicyGroup;

/// Two concatenated capitalized words, e.g. `DeveloperAa`.
pub const IDENTITY_NAME_PATTERN: &str = r"^[A-Z][a-z]{1,25}[A-Z][a-z]{1,25}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IdentityKind {
    Human,
    Service,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
            Self::Service => f.write_str("service"),
        }
    }
}

/// A principal assigned exactly one policy group.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub kind: IdentityKind,
    /// Catalog name of the assigned group
    pub group_name: String,
    pub group: Arc<PolicyGroup>,
}

/// Compiled identity naming convention.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    pattern: Regex,
}

impl NamingConvention {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(IDENTITY_NAME_PATTERN)?,
        })
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Check every name, logging each violation.
    ///
    /// All names are checked before failing so the error lists every
    /// offender at once.
    pub fn validate<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut violations: Vec<String> = names
            .into_iter()
            .filter(|name| !self.is_valid(name))
            .map(str::to_string)
            .collect();

        if violations.is_empty() {
            return Ok(());
        }
        violations.sort();
        for name in &violations {
            error!("{} is not compliant with naming convention", name);
        }
        Err(GeneratorError::NamingConvention { names: violations })
    }
}
