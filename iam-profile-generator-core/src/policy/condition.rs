//! Qualifiers attached to a policy statement.

use derive_new::new;
use serde::{Deserialize, Serialize};

/// A single named condition block of a statement, e.g.
/// `StringLike: { s3:prefix: ["team/*"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Condition {
    /// Label emitted as a comment above the block
    #[new(into)]
    pub(crate) name: String,
    /// Condition operator such as `StringLike` or `StringEquals`
    #[new(into)]
    pub(crate) operator: String,
    /// The context key being tested, e.g. `s3:prefix`
    #[new(into)]
    pub(crate) condition_key: String,
    /// Allowed values, kept in declaration order
    pub(crate) values: Vec<String>,
}

impl Condition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn condition_key(&self) -> &str {
        &self.condition_key
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_creation() {
        let condition = Condition::new(
            "OnlyTeamPrefix",
            "StringLike",
            "s3:prefix",
            vec!["team/*".to_string()],
        );

        assert_eq!(condition.name(), "OnlyTeamPrefix");
        assert_eq!(condition.operator(), "StringLike");
        assert_eq!(condition.condition_key(), "s3:prefix");
        assert_eq!(condition.values(), ["team/*"]);
    }
}
