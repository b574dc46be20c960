//! Renders every identity's documents and commits them as one unit.
//!
//! A run is fail-closed: names are validated and every document is rendered
//! in memory before anything touches the filesystem.

use std::path::PathBuf;

use log::{debug, info};

use crate::catalog::Catalog;
use crate::errors::{GeneratorError, Result};
use crate::identity::{Identity, NamingConvention};
use crate::providers::FileSystemProvider;
use crate::template::{placeholder, substitute, Parameters, Templates};
use crate::yaml::{policies_to_yaml, ToYaml, INDENT};

mod config;

pub use config::{GeneratorConfig, POLICY_DOCUMENT_VERSION, TEMPLATE_FORMAT_VERSION};

/// Indentation of a `ManagedPolicyArns` entry in the profile template
const POLICY_REFERENCE_DEPTH: usize = 4;

/// Role name assumed by a human identity
pub fn role_name(identity_name: &str) -> String {
    format!("PersonalRole{}", identity_name)
}

/// A rendered document and the path it will be committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub path: PathBuf,
    pub contents: String,
}

/// Outcome of a successful [`Generator::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub profiles: usize,
    pub service_stacks: usize,
    pub written: Vec<PathBuf>,
}

pub struct Generator {
    catalog: Catalog,
    templates: Templates,
    config: GeneratorConfig,
    naming: NamingConvention,
}

impl Generator {
    /// # Errors
    /// Returns [`GeneratorError::Template`] when a template lacks a
    /// placeholder the generator fills with rendered statements.
    pub fn new(catalog: Catalog, templates: Templates, config: GeneratorConfig) -> Result<Self> {
        require_placeholder("profile", &templates.profile, "Policies")?;
        require_placeholder("policy", &templates.policy, "Effects")?;
        require_placeholder("service user", &templates.service_user, "Effects")?;
        Ok(Self {
            catalog,
            templates,
            config,
            naming: NamingConvention::new()?,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Validate every human identity name against the naming convention.
    pub fn check(&self) -> Result<()> {
        self.naming
            .validate(self.catalog.humans().map(|identity| identity.name.as_str()))
    }

    /// Render every profile, then every service stack, each in name order.
    pub fn render(&self) -> Result<Vec<RenderedDocument>> {
        self.check()?;
        let profiles = self.catalog.humans().map(|identity| self.render_profile(identity));
        let stacks = self
            .catalog
            .services()
            .map(|identity| self.render_service_stack(identity));
        Ok(profiles.chain(stacks).collect())
    }

    /// Validate, render and commit every document.
    pub fn run(&self) -> Result<GenerationSummary> {
        let documents = self.render()?;
        let files: Vec<(&PathBuf, &str)> = documents
            .iter()
            .map(|document| (&document.path, document.contents.as_str()))
            .collect();
        FileSystemProvider::write_all(&files)?;

        for document in &documents {
            info!("Wrote {}", document.path.display());
        }
        let summary = GenerationSummary {
            profiles: self.catalog.humans().count(),
            service_stacks: self.catalog.services().count(),
            written: documents.into_iter().map(|document| document.path).collect(),
        };
        info!(
            "Generated {} profiles and {} service stacks under {}",
            summary.profiles,
            summary.service_stacks,
            self.config.output_dir().display()
        );
        Ok(summary)
    }

    fn base_parameters(&self) -> Parameters {
        Parameters::new()
            .with("TemplateFormatVersion", &self.config.template_format_version)
            .with("PolicyDocumentVersion", &self.config.policy_document_version)
    }

    /// Profile document for a human identity.
    ///
    /// The flattened group is split by category; each category becomes one
    /// managed policy inlined into the profile and referenced by the role.
    pub fn render_profile(&self, identity: &Identity) -> RenderedDocument {
        let name = identity.name.as_str();
        let role = role_name(name);
        let parameters = self
            .base_parameters()
            .with(
                "AssumeRolePolicyDocumentVersion",
                &self.config.assume_role_policy_document_version,
            )
            .with("ProfileDescription", format!("Personal IAM Profile for {}", name))
            .with("RoleName", &role)
            .with("InstanceProfileName", format!("PersonalInstanceProfile{}", name));
        let role_parameters = Parameters::new().with("RoleName", &role);

        let categories = self
            .catalog
            .category_prefixes()
            .partition(identity.group.flatten());

        let mut references = Vec::with_capacity(categories.len());
        let mut policies = String::new();
        for (category, members) in &categories {
            let policy_name = format!("PersonalPolicy{}{}", category, name);
            let effects = substitute(
                &policies_to_yaml(members.iter().map(|policy| &**policy)),
                &role_parameters,
            );
            let document = parameters
                .clone()
                .with("PolicyName", &policy_name)
                .with(
                    "PolicyDescription",
                    format!("Personal Policy {} for {}", category, name),
                )
                .with("Effects", effects);
            policies.push_str(&substitute(&self.templates.policy, &document));
            policies.push('\n');
            references.push(format!(
                "{}- !Ref {}",
                INDENT.repeat(POLICY_REFERENCE_DEPTH),
                policy_name
            ));
        }
        debug!("Profile {} has {} policy documents", name, categories.len());

        let parameters = parameters
            .with("PolicyReferences", references.join("\n"))
            .with("Policies", policies);
        RenderedDocument {
            path: self.config.profile_path(name),
            contents: substitute(&self.templates.profile, &parameters),
        }
    }

    /// Stack document for a service identity: one managed policy holding
    /// the whole flattened group.
    pub fn render_service_stack(&self, identity: &Identity) -> RenderedDocument {
        let name = identity.name.as_str();
        let parameters = self
            .base_parameters()
            .with("StackDescription", format!("IAM stack for service {}", name))
            .with("PolicyName", format!("PolicyFor{}", name))
            // No trailing whitespace after the name
            .with("PolicyDescription", format!("IAM policy for service {}", name))
            .with("Effects", identity.group.to_yaml())
            .with("GroupName", format!("IamGroup{}", name))
            .with("UserName", name);
        RenderedDocument {
            path: self.config.service_stack_path(name),
            contents: substitute(&self.templates.service_user, &parameters),
        }
    }
}

fn require_placeholder(template: &str, text: &str, key: &str) -> Result<()> {
    let token = placeholder(key);
    if text.contains(&token) {
        Ok(())
    } else {
        Err(GeneratorError::template(format!(
            "The {} template has no {} placeholder",
            template, token
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFormat;
    use std::fs;
    use tempfile::TempDir;

    const CATALOG: &str = r#"
        category_prefixes = ["S3", "SecretManager"]

        [[policies]]
        name = "SecretManagerBoxReadOnly"
        effect = "Allow"
        actions = ["secretsmanager:GetSecretValue"]
        resources = ["arn:aws:secretsmanager:*:*:secret:Box/*"]

        [[policies]]
        name = "S3AllowReadOnBucketOperationsb"
        kind = "s3-read"
        resources = ["arn:aws:s3:::operationsb", "arn:aws:s3:::operationsb/*"]

        [[policies]]
        name = "S3WriteOwnHome"
        kind = "s3-write"
        resources = ["arn:aws:s3:::home/{RoleName}/*"]

        [[policies]]
        name = "AuroraDataApiAllowAll"
        effect = "Allow"
        actions = ["rds-data:ExecuteStatement"]
        resources = ["*"]

        [[policy_groups]]
        name = "Base"
        policies = ["SecretManagerBoxReadOnly"]

        [[policy_groups]]
        name = "TeamB"
        policies = ["S3AllowReadOnBucketOperationsb", "S3WriteOwnHome"]
        policy_groups = ["Base"]

        [[policy_groups]]
        name = "Web"
        policies = ["AuroraDataApiAllowAll"]
        policy_groups = ["Base"]

        [humans]
        DeveloperCc = "TeamB"
        DeveloperDd = "TeamB"

        [services]
        ServiceUserProdWeb = "Web"
    "#;

    fn templates() -> Templates {
        Templates {
            profile: "Role: {RoleName}\nManagedPolicyArns:\n{PolicyReferences}\n{Policies}".to_string(),
            policy: "  {PolicyName}: # {PolicyDescription}\n    Statement:{Effects}".to_string(),
            service_user: "User: {UserName}\nGroup: {GroupName}\nStatement:{Effects}".to_string(),
        }
    }

    fn generator(catalog: &str, output: &std::path::Path) -> Generator {
        let catalog = Catalog::parse(catalog, CatalogFormat::Toml).unwrap();
        let config = GeneratorConfig::default().with_output_dir(output);
        Generator::new(catalog, templates(), config).unwrap()
    }

    #[test]
    fn test_profile_split_by_category() {
        let dir = TempDir::new().unwrap();
        let generator = generator(CATALOG, dir.path());
        let identity = generator.catalog().identity("DeveloperCc").unwrap();
        let profile = generator.render_profile(identity);

        assert_eq!(
            profile.path,
            dir.path().join("personal-profiles/profile-DeveloperCc.yml")
        );
        assert!(profile.contents.starts_with("Role: PersonalRoleDeveloperCc\n"));

        let references = "ManagedPolicyArns:\
                          \n        - !Ref PersonalPolicyS3DeveloperCc\
                          \n        - !Ref PersonalPolicySecretManagerDeveloperCc\n";
        assert!(profile.contents.contains(references));

        let s3 = profile
            .contents
            .find("  PersonalPolicyS3DeveloperCc: # Personal Policy S3 for DeveloperCc")
            .unwrap();
        let secrets = profile
            .contents
            .find("  PersonalPolicySecretManagerDeveloperCc:")
            .unwrap();
        assert!(s3 < secrets);
        assert!(!profile.contents.contains("Misc"));
    }

    #[test]
    fn test_profile_substitutes_role_name_in_statements() {
        let dir = TempDir::new().unwrap();
        let generator = generator(CATALOG, dir.path());
        let identity = generator.catalog().identity("DeveloperCc").unwrap();
        let profile = generator.render_profile(identity);

        assert!(profile
            .contents
            .contains("\"arn:aws:s3:::home/PersonalRoleDeveloperCc/*\""));
        assert!(!profile.contents.contains("{RoleName}"));
    }

    #[test]
    fn test_same_group_renders_same_documents() {
        let dir = TempDir::new().unwrap();
        let generator = generator(CATALOG, dir.path());
        let cc = generator.render_profile(generator.catalog().identity("DeveloperCc").unwrap());
        let dd = generator.render_profile(generator.catalog().identity("DeveloperDd").unwrap());

        assert_ne!(cc.contents, dd.contents);
        assert_eq!(cc.contents.replace("DeveloperCc", "DeveloperDd"), dd.contents);
    }

    #[test]
    fn test_service_stack_holds_whole_group() {
        let dir = TempDir::new().unwrap();
        let generator = generator(CATALOG, dir.path());
        let identity = generator.catalog().identity("ServiceUserProdWeb").unwrap();
        let stack = generator.render_service_stack(identity);

        assert_eq!(
            stack.path,
            dir.path()
                .join("service-user-stacks/service-user-ServiceUserProdWeb.yml")
        );
        let expected = format!(
            "User: ServiceUserProdWeb\nGroup: IamGroupServiceUserProdWeb\nStatement:{}",
            identity.group.to_yaml()
        );
        assert_eq!(stack.contents, expected);
        let aurora = stack.contents.find("# AuroraDataApiAllowAll").unwrap();
        let secrets = stack.contents.find("# SecretManagerBoxReadOnly").unwrap();
        assert!(aurora < secrets);
    }

    #[test]
    fn test_service_stack_descriptions() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::parse(CATALOG, CatalogFormat::Toml).unwrap();
        let mut templates = templates();
        templates.service_user =
            "[{StackDescription}]\n[{PolicyDescription}]\n[{PolicyName}]{Effects}".to_string();
        let generator = Generator::new(
            catalog,
            templates,
            GeneratorConfig::default().with_output_dir(dir.path()),
        )
        .unwrap();
        let identity = generator.catalog().identity("ServiceUserProdWeb").unwrap();
        let stack = generator.render_service_stack(identity);

        assert!(stack.contents.starts_with(
            "[IAM stack for service ServiceUserProdWeb]\n\
             [IAM policy for service ServiceUserProdWeb]\n\
             [PolicyForServiceUserProdWeb]"
        ));
    }

    #[test]
    fn test_run_writes_every_document() {
        let dir = TempDir::new().unwrap();
        let summary = generator(CATALOG, dir.path()).run().unwrap();

        assert_eq!(summary.profiles, 2);
        assert_eq!(summary.service_stacks, 1);
        assert_eq!(summary.written.len(), 3);
        for path in &summary.written {
            assert!(FileSystemProvider::file_exists(path).unwrap());
        }
        let written = fs::read_to_string(
            dir.path().join("personal-profiles/profile-DeveloperDd.yml"),
        )
        .unwrap();
        assert!(written.starts_with("Role: PersonalRoleDeveloperDd"));
    }

    #[test]
    fn test_invalid_human_name_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let catalog = CATALOG.replace("DeveloperDd = ", "developerAa = ");
        let result = generator(&catalog, dir.path()).run();

        match result {
            Err(GeneratorError::NamingConvention { names }) => {
                assert_eq!(names, ["developerAa"]);
            }
            other => panic!("Expected NamingConvention error, got {:?}", other),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_service_names_are_not_validated() {
        let dir = TempDir::new().unwrap();
        let generator = generator(CATALOG, dir.path());
        // ServiceUserProdWeb has three words
        assert!(generator.check().is_ok());
    }

    #[test]
    fn test_empty_group_keeps_reference_placeholder() {
        let dir = TempDir::new().unwrap();
        let catalog = r#"
            [[policy_groups]]
            name = "Empty"

            [humans]
            DeveloperAa = "Empty"
        "#;
        let generator = generator(catalog, dir.path());
        let profile = generator.render_profile(generator.catalog().identity("DeveloperAa").unwrap());
        assert!(profile.contents.contains("{PolicyReferences}"));
        assert!(profile.contents.contains("{Policies}"));
    }

    #[test]
    fn test_template_without_effects_rejected() {
        let catalog = Catalog::parse(CATALOG, CatalogFormat::Toml).unwrap();
        let mut templates = templates();
        templates.policy = "Statement: []".to_string();
        let result = Generator::new(catalog, templates, GeneratorConfig::default());
        assert!(matches!(result, Err(GeneratorError::Template(_))));
    }

    #[test]
    fn test_embedded_templates_render_default_catalog() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(
            Catalog::embedded_default().unwrap(),
            Templates::embedded().unwrap(),
            GeneratorConfig::default().with_output_dir(dir.path()),
        )
        .unwrap();

        let documents = generator.render().unwrap();
        assert!(!documents.is_empty());
        for document in &documents {
            assert!(!document.contents.contains("{Effects}"));
            assert!(!document.contents.contains("{RoleName}"));
        }
    }
}
