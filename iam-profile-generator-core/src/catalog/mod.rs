//! Registry of policies, policy groups and identities.
//!
//! The catalog is assembled once, in declaration order, and is read-only
//! afterwards. Groups are resolved against the groups registered so far, so
//! a reference to a group that has not been declared yet is rejected. This
//! keeps the group graph acyclic by construction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::category::CategoryPrefixes;
use crate::embedded_data::EmbeddedCatalog;
use crate::errors::{GeneratorError, Result};
use crate::identity::{Identity, IdentityKind};
use crate::policy::{Policy, PolicyGroup};
use crate::providers::FileSystemProvider;

mod definition;

pub use definition::{
    ActionList, CatalogDefinition, IdentityAssignments, PolicyDefinition, PolicyGroupDefinition,
    PolicyKind,
};

/// Source format of a catalog document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Toml,
    Json,
}

impl CatalogFormat {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Policies, groups and identities, all keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    category_prefixes: CategoryPrefixes,
    policies: BTreeMap<String, Arc<Policy>>,
    policy_groups: BTreeMap<String, Arc<PolicyGroup>>,
    humans: BTreeMap<String, Identity>,
    services: BTreeMap<String, Identity>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Parse a catalog document in the given format.
    pub fn parse(text: &str, format: CatalogFormat) -> Result<Self> {
        let definition: CatalogDefinition = match format {
            CatalogFormat::Toml => toml::from_str(text)?,
            CatalogFormat::Json => serde_json::from_str(text)?,
        };
        Self::from_definition(definition)
    }

    /// Read and parse a catalog file, choosing the format by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        info!("Loading catalog from {}", path.display());
        let text = FileSystemProvider::read_file(path)?;
        Self::parse(&text, CatalogFormat::from_path(path))
    }

    /// The catalog compiled into the binary.
    pub fn embedded_default() -> Result<Self> {
        Self::parse(&EmbeddedCatalog::default_catalog()?, CatalogFormat::Toml)
    }

    /// Load from `path` when given, otherwise use the embedded default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded_default(),
        }
    }

    pub fn from_definition(definition: CatalogDefinition) -> Result<Self> {
        let mut builder =
            Self::builder().category_prefixes(CategoryPrefixes::new(definition.category_prefixes));

        for policy in definition.policies {
            builder.add_policy(Policy::try_from(policy)?)?;
        }
        for group in definition.policy_groups {
            builder.add_group(&group.name, &group.policies, &group.policy_groups)?;
        }
        for (name, group) in definition.humans.iter() {
            builder.add_identity(IdentityKind::Human, name, group)?;
        }
        for (name, group) in definition.services.iter() {
            builder.add_identity(IdentityKind::Service, name, group)?;
        }

        let catalog = builder.build();
        debug!(
            "Catalog holds {} policies, {} groups, {} humans, {} services",
            catalog.policies.len(),
            catalog.policy_groups.len(),
            catalog.humans.len(),
            catalog.services.len()
        );
        Ok(catalog)
    }

    pub fn category_prefixes(&self) -> &CategoryPrefixes {
        &self.category_prefixes
    }

    pub fn policy(&self, name: &str) -> Option<&Arc<Policy>> {
        self.policies.get(name)
    }

    pub fn policy_group(&self, name: &str) -> Option<&Arc<PolicyGroup>> {
        self.policy_groups.get(name)
    }

    /// Human identities in ascending name order
    pub fn humans(&self) -> impl Iterator<Item = &Identity> {
        self.humans.values()
    }

    /// Service identities in ascending name order
    pub fn services(&self) -> impl Iterator<Item = &Identity> {
        self.services.values()
    }

    /// Look up an identity of either kind.
    pub fn identity(&self, name: &str) -> Option<&Identity> {
        self.humans.get(name).or_else(|| self.services.get(name))
    }
}

/// Incremental, order-sensitive catalog construction.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    #[must_use]
    pub fn category_prefixes(mut self, prefixes: CategoryPrefixes) -> Self {
        self.catalog.category_prefixes = prefixes;
        self
    }

    /// Register a policy under its name.
    pub fn add_policy(&mut self, policy: Policy) -> Result<Arc<Policy>> {
        if self.catalog.policies.contains_key(policy.name()) {
            return Err(GeneratorError::catalog(format!(
                "Policy {} is declared more than once",
                policy.name()
            )));
        }
        let policy = Arc::new(policy);
        self.catalog
            .policies
            .insert(policy.name().to_string(), Arc::clone(&policy));
        Ok(policy)
    }

    /// Build and register a group from already registered policies and groups.
    pub fn add_group<S: AsRef<str>>(
        &mut self,
        name: &str,
        policies: &[S],
        policy_groups: &[S],
    ) -> Result<Arc<PolicyGroup>> {
        let mut builder = PolicyGroup::builder();
        for policy in policies {
            let policy = policy.as_ref();
            let resolved = self.catalog.policies.get(policy).ok_or_else(|| {
                GeneratorError::catalog(format!(
                    "Policy group {} references unknown policy {}",
                    name, policy
                ))
            })?;
            builder = builder.policy(Arc::clone(resolved));
        }
        for group in policy_groups {
            let group = group.as_ref();
            let resolved = self.catalog.policy_groups.get(group).ok_or_else(|| {
                GeneratorError::catalog(format!(
                    "Policy group {} references {}, which must be declared before it",
                    name, group
                ))
            })?;
            builder = builder.group(Arc::clone(resolved));
        }
        self.insert_group(name, builder.build())
    }

    /// Register a group built in code.
    pub fn insert_group(
        &mut self,
        name: &str,
        group: impl Into<Arc<PolicyGroup>>,
    ) -> Result<Arc<PolicyGroup>> {
        if self.catalog.policy_groups.contains_key(name) {
            return Err(GeneratorError::catalog(format!(
                "Policy group {} is declared more than once",
                name
            )));
        }
        let group = group.into();
        self.catalog
            .policy_groups
            .insert(name.to_string(), Arc::clone(&group));
        Ok(group)
    }

    /// Assign a registered group to a human or service identity.
    pub fn add_identity(&mut self, kind: IdentityKind, name: &str, group_name: &str) -> Result<()> {
        let group = self
            .catalog
            .policy_groups
            .get(group_name)
            .ok_or_else(|| {
                GeneratorError::catalog(format!(
                    "{} identity {} is assigned unknown policy group {}",
                    kind, name, group_name
                ))
            })?;

        if self.catalog.identity(name).is_some() {
            return Err(GeneratorError::catalog(format!(
                "Identity {} is declared more than once",
                name
            )));
        }

        let identity = Identity {
            name: name.to_string(),
            kind,
            group_name: group_name.to_string(),
            group: Arc::clone(group),
        };
        let registry = match kind {
            IdentityKind::Human => &mut self.catalog.humans,
            IdentityKind::Service => &mut self.catalog.services,
        };
        registry.insert(name.to_string(), identity);
        Ok(())
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}
