//! Nestable bundles of policies.
//!
//! A group may only reference groups that already exist: [`PolicyGroupBuilder`]
//! takes fully built `Arc<PolicyGroup>` values, and a group can't be modified
//! after [`PolicyGroupBuilder::build`]. A group therefore can never reach
//! itself, and the reference graph is a DAG without any runtime cycle check.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use log::debug;

use super::Policy;

/// A bundle of policies and previously built groups.
#[derive(Debug, Default)]
pub struct PolicyGroup {
    policies: Vec<Arc<Policy>>,
    policy_groups: Vec<Arc<PolicyGroup>>,
    flattened: OnceLock<BTreeSet<Arc<Policy>>>,
}

impl PolicyGroup {
    pub fn builder() -> PolicyGroupBuilder {
        PolicyGroupBuilder::default()
    }

    /// Policies assigned directly to this group
    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }

    /// Groups referenced by this group
    pub fn policy_groups(&self) -> &[Arc<PolicyGroup>] {
        &self.policy_groups
    }

    /// Deduplicated union of the direct policies and every referenced group.
    ///
    /// Policies are keyed by name. When two distinct policies share a name,
    /// the first one inserted wins: direct policies first, then each
    /// referenced group in declaration order. The result is computed on the
    /// first call and reused afterwards.
    pub fn flatten(&self) -> &BTreeSet<Arc<Policy>> {
        self.flattened.get_or_init(|| {
            // insert() keeps the existing entry on a name clash; collect() would not
            let mut flattened = BTreeSet::new();
            for policy in &self.policies {
                flattened.insert(Arc::clone(policy));
            }
            for group in &self.policy_groups {
                for policy in group.flatten() {
                    flattened.insert(Arc::clone(policy));
                }
            }
            debug!(
                "Flattened group with {} direct policies and {} sub-groups into {} policies",
                self.policies.len(),
                self.policy_groups.len(),
                flattened.len()
            );
            flattened
        })
    }
}

/// Builder for [`PolicyGroup`].
#[derive(Debug, Default)]
pub struct PolicyGroupBuilder {
    policies: Vec<Arc<Policy>>,
    policy_groups: Vec<Arc<PolicyGroup>>,
}

impl PolicyGroupBuilder {
    #[must_use]
    pub fn policy(mut self, policy: impl Into<Arc<Policy>>) -> Self {
        self.policies.push(policy.into());
        self
    }

    #[must_use]
    pub fn policies<I, P>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Arc<Policy>>,
    {
        self.policies.extend(policies.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn group(mut self, group: Arc<PolicyGroup>) -> Self {
        self.policy_groups.push(group);
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: impl IntoIterator<Item = Arc<PolicyGroup>>) -> Self {
        self.policy_groups.extend(groups);
        self
    }

    pub fn build(self) -> PolicyGroup {
        PolicyGroup {
            policies: self.policies,
            policy_groups: self.policy_groups,
            flattened: OnceLock::new(),
        }
    }
}
