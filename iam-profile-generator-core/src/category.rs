//! Name-prefix partitioning of a flattened policy set.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Category for policies that match no configured prefix
pub const MISC_CATEGORY: &str = "Misc";

/// Ordered list of recognized policy-name prefixes.
///
/// Each prefix names a category; a policy lands in the first category whose
/// prefix its name starts with, or in [`MISC_CATEGORY`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPrefixes(Vec<String>);

/// Policies grouped by category, iterated in ascending category name.
pub type Categories = BTreeMap<String, Vec<Arc<Policy>>>;

impl CategoryPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn prefixes(&self) -> &[String] {
        &self.0
    }

    /// Category of a single policy name, first match wins.
    pub fn categorize(&self, policy_name: &str) -> &str {
        self.0
            .iter()
            .find(|prefix| policy_name.starts_with(prefix.as_str()))
            .map_or(MISC_CATEGORY, String::as_str)
    }

    /// Assign every policy to exactly one category.
    ///
    /// Policies inside each category are ordered by name.
    pub fn partition<'a, I>(&self, policies: I) -> Categories
    where
        I: IntoIterator<Item = &'a Arc<Policy>>,
    {
        let mut categories = Categories::new();
        for policy in policies {
            categories
                .entry(self.categorize(policy.name()).to_string())
                .or_default()
                .push(Arc::clone(policy));
        }
        for (category, members) in &mut categories {
            members.sort();
            debug!("Category {} holds {} policies", category, members.len());
        }
        categories
    }
}
