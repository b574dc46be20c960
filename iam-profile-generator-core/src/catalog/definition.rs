//! Serde model of a catalog document.
//!
//! ```toml
//! category_prefixes = ["S3", "SecretManager"]
//!
//! [[policies]]
//! name = "SecretManagerBoxReadOnly"
//! effect = "Allow"
//! actions = ["secretsmanager:GetSecretValue"]
//! resources = ["arn:aws:secretsmanager:*:*:secret:Box/*"]
//!
//! [[policies]]
//! name = "S3ListTeamPrefix"
//! kind = "s3-list-bucket-prefix"
//! bucket = "operations"
//! prefix = "team/"
//!
//! [[policy_groups]]
//! name = "Base"
//! policies = ["SecretManagerBoxReadOnly", "S3ListTeamPrefix"]
//!
//! [humans]
//! DeveloperAa = "Base"
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::errors::{GeneratorError, Result};
use crate::policy::{Condition, Effect, Policy};

/// Top-level catalog document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub category_prefixes: Vec<String>,
    #[serde(default)]
    pub policies: Vec<PolicyDefinition>,
    /// Groups, in declaration order. A group may only reference earlier ones.
    #[serde(default)]
    pub policy_groups: Vec<PolicyGroupDefinition>,
    /// Human identity name to group name
    #[serde(default)]
    pub humans: IdentityAssignments,
    /// Service identity name to group name
    #[serde(default)]
    pub services: IdentityAssignments,
}

/// Identity name to group name pairs in document order.
///
/// Repeated names are kept rather than collapsed, so the registry can reject
/// them. JSON objects allow repeated keys and a plain map would silently
/// keep the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityAssignments(Vec<(String, String)>);

impl IdentityAssignments {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, group)| (name.as_str(), group.as_str()))
    }
}

impl<'de> Deserialize<'de> for IdentityAssignments {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{MapAccess, Visitor};

        struct AssignmentsVisitor;

        impl<'de> Visitor<'de> for AssignmentsVisitor {
            type Value = IdentityAssignments;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of identity name to policy group name")
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<IdentityAssignments, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(IdentityAssignments(entries))
            }
        }

        deserializer.deserialize_map(AssignmentsVisitor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Custom,
    S3Read,
    S3Write,
    S3Delete,
    S3ListBucketPrefix,
}

/// The `actions` field as written, so that a bare string can be rejected
/// instead of being coerced into a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActionList {
    Sequence(Vec<String>),
    Scalar(String),
}

impl ActionList {
    pub fn into_actions(self) -> Result<Vec<String>> {
        match self {
            Self::Sequence(actions) => Ok(actions),
            Self::Scalar(action) => Err(GeneratorError::invalid_argument(format!(
                "Actions must be a list, got {:?}",
                action
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: PolicyKind,
    pub effect: Option<String>,
    pub actions: Option<ActionList>,
    #[serde(default)]
    pub resources: Vec<String>,
    pub conditions: Option<Vec<Condition>>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyGroupDefinition {
    pub name: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub policy_groups: Vec<String>,
}

impl PolicyDefinition {
    fn invalid(&self, message: &str) -> GeneratorError {
        GeneratorError::invalid_argument(format!("Policy {}: {}", self.name, message))
    }

    fn reject_fixed_fields(&self) -> Result<()> {
        if self.effect.is_some() || self.actions.is_some() {
            return Err(self.invalid("effect and actions are fixed for this kind"));
        }
        if self.conditions.is_some() {
            return Err(self.invalid("conditions are not supported for this kind"));
        }
        Ok(())
    }
}

impl TryFrom<PolicyDefinition> for Policy {
    type Error = GeneratorError;

    fn try_from(definition: PolicyDefinition) -> Result<Self> {
        // A scalar action list is a misuse whatever the kind
        let actions = definition
            .actions
            .clone()
            .map(ActionList::into_actions)
            .transpose()?;

        if definition.kind != PolicyKind::S3ListBucketPrefix
            && (definition.bucket.is_some() || definition.prefix.is_some())
        {
            return Err(definition.invalid("bucket and prefix only apply to s3-list-bucket-prefix"));
        }

        match definition.kind {
            PolicyKind::Custom => {
                let effect: Effect = definition
                    .effect
                    .as_deref()
                    .ok_or_else(|| definition.invalid("effect is required"))?
                    .parse()?;
                let actions = actions.ok_or_else(|| definition.invalid("actions are required"))?;
                let policy = Policy::new(definition.name, effect, actions, definition.resources)?;
                Ok(match definition.conditions {
                    Some(conditions) => policy.with_conditions(conditions),
                    None => policy,
                })
            }
            PolicyKind::S3Read => {
                definition.reject_fixed_fields()?;
                Ok(Policy::s3_read(definition.name, definition.resources))
            }
            PolicyKind::S3Write => {
                definition.reject_fixed_fields()?;
                Ok(Policy::s3_write(definition.name, definition.resources))
            }
            PolicyKind::S3Delete => {
                definition.reject_fixed_fields()?;
                Ok(Policy::s3_delete(definition.name, definition.resources))
            }
            PolicyKind::S3ListBucketPrefix => {
                definition.reject_fixed_fields()?;
                if !definition.resources.is_empty() {
                    return Err(definition.invalid("resources are derived from bucket"));
                }
                let bucket = definition
                    .bucket
                    .as_deref()
                    .ok_or_else(|| definition.invalid("bucket is required"))?;
                let prefix = definition
                    .prefix
                    .as_deref()
                    .ok_or_else(|| definition.invalid("prefix is required"))?;
                Ok(Policy::s3_list_bucket_prefix(
                    definition.name.as_str(),
                    bucket,
                    prefix,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_policy(text: &str) -> Result<Policy> {
        let definition: PolicyDefinition = toml::from_str(text)?;
        Policy::try_from(definition)
    }

    #[test]
    fn test_custom_policy() {
        let policy = parse_policy(
            r#"
            name = "AuroraDataApiAllowAll"
            effect = "Allow"
            actions = ["rds-data:ExecuteStatement"]
            resources = ["*"]
            "#,
        )
        .unwrap();

        assert_eq!(policy.name(), "AuroraDataApiAllowAll");
        assert_eq!(policy.effect(), Effect::Allow);
        assert_eq!(policy.actions(), ["rds-data:ExecuteStatement"]);
        assert!(policy.conditions().is_none());
    }

    #[test]
    fn test_scalar_actions_rejected() {
        let result = parse_policy(
            r#"
            name = "Scalar"
            effect = "Allow"
            actions = "s3:GetObject"
            resources = ["*"]
            "#,
        );

        match result {
            Err(GeneratorError::InvalidArgument(message)) => {
                assert!(message.contains("Actions must be a list"));
                assert!(message.contains("s3:GetObject"));
            }
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_actions_rejected_in_json() {
        let definition: PolicyDefinition = serde_json::from_str(
            r#"{"name": "Scalar", "effect": "Deny", "actions": "s3:GetObject"}"#,
        )
        .unwrap();
        assert!(matches!(
            Policy::try_from(definition),
            Err(GeneratorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_custom_policy_with_conditions() {
        let policy = parse_policy(
            r#"
            name = "SecretsInRegion"
            effect = "Allow"
            actions = ["secretsmanager:GetSecretValue"]
            resources = ["*"]

            [[conditions]]
            name = "OnlyUsEast1"
            operator = "StringEquals"
            condition_key = "aws:RequestedRegion"
            values = ["us-east-1"]
            "#,
        )
        .unwrap();

        let conditions = policy.conditions().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].condition_key(), "aws:RequestedRegion");
    }

    #[test]
    fn test_custom_policy_requires_effect_and_actions() {
        let missing_effect = parse_policy(
            r#"
            name = "NoEffect"
            actions = ["s3:GetObject"]
            "#,
        );
        assert!(matches!(missing_effect, Err(GeneratorError::InvalidArgument(_))));

        let missing_actions = parse_policy(
            r#"
            name = "NoActions"
            effect = "Allow"
            "#,
        );
        assert!(matches!(missing_actions, Err(GeneratorError::InvalidArgument(_))));

        let bad_effect = parse_policy(
            r#"
            name = "BadEffect"
            effect = "Permit"
            actions = ["s3:GetObject"]
            "#,
        );
        assert!(matches!(bad_effect, Err(GeneratorError::InvalidArgument(_))));
    }

    #[test]
    fn test_canonical_kinds() {
        let read = parse_policy(
            r#"
            name = "S3Read"
            kind = "s3-read"
            resources = ["arn:aws:s3:::operationsa"]
            "#,
        )
        .unwrap();
        assert_eq!(read.actions().len(), 6);

        let delete = parse_policy(
            r#"
            name = "S3Delete"
            kind = "s3-delete"
            resources = ["arn:aws:s3:::operationsa/*"]
            "#,
        )
        .unwrap();
        assert_eq!(delete.actions(), ["s3:DeleteObject"]);
    }

    #[test]
    fn test_canonical_kind_rejects_actions() {
        let result = parse_policy(
            r#"
            name = "S3Write"
            kind = "s3-write"
            actions = ["s3:DeleteObject"]
            resources = ["*"]
            "#,
        );
        assert!(matches!(result, Err(GeneratorError::InvalidArgument(_))));
    }

    #[test]
    fn test_list_bucket_prefix_kind() {
        let policy = parse_policy(
            r#"
            name = "S3ListTeam"
            kind = "s3-list-bucket-prefix"
            bucket = "b"
            prefix = "team/"
            "#,
        )
        .unwrap();
        assert_eq!(policy.resources(), ["arn:aws:s3:::b"]);
        assert_eq!(policy.conditions().unwrap()[0].values(), ["team/*"]);

        let missing_prefix = parse_policy(
            r#"
            name = "S3ListTeam"
            kind = "s3-list-bucket-prefix"
            bucket = "b"
            "#,
        );
        assert!(matches!(missing_prefix, Err(GeneratorError::InvalidArgument(_))));
    }

    #[test]
    fn test_bucket_outside_list_kind_rejected() {
        let result = parse_policy(
            r#"
            name = "S3Read"
            kind = "s3-read"
            bucket = "b"
            "#,
        );
        assert!(matches!(result, Err(GeneratorError::InvalidArgument(_))));
    }

    #[test]
    fn test_identity_assignments_keep_repeated_names() {
        let definition: CatalogDefinition =
            serde_json::from_str(r#"{"humans": {"DeveloperAa": "A", "DeveloperAa": "B"}}"#)
                .unwrap();
        let pairs: Vec<(&str, &str)> = definition.humans.iter().collect();
        assert_eq!(pairs, [("DeveloperAa", "A"), ("DeveloperAa", "B")]);
        assert_eq!(definition.services.iter().count(), 0);
    }

    #[test]
    fn test_identity_assignments_keep_document_order() {
        let definition: CatalogDefinition = toml::from_str(
            r#"
            [services]
            ServiceUserProdWeb = "Web"
            ServiceUserBatch = "Batch"
            "#,
        )
        .unwrap();
        let names: Vec<&str> = definition.services.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["ServiceUserProdWeb", "ServiceUserBatch"]);
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result = parse_policy(
            r#"
            name = "S3Read"
            kind = "s3-everything"
            "#,
        );
        assert!(matches!(result, Err(GeneratorError::Toml(_))));
    }
}
