//! Composition of IAM policy groups into per-identity CloudFormation documents.
//!
//! Policies are bundled into nestable [`PolicyGroup`]s. Each human or service
//! identity is assigned one group, which is flattened into a deduplicated,
//! name-ordered statement set, partitioned by name prefix and rendered into
//! templates. The [`Generator`] renders every document in memory and commits
//! them together.
//!
//! ```no_run
//! use iam_profile_generator_core::{Catalog, Generator, GeneratorConfig, Templates};
//!
//! # fn main() -> iam_profile_generator_core::Result<()> {
//! let generator = Generator::new(
//!     Catalog::embedded_default()?,
//!     Templates::embedded()?,
//!     GeneratorConfig::default().with_output_dir("iam"),
//! )?;
//! generator.run()?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod category;
pub mod embedded_data;
pub mod errors;
pub mod generator;
pub mod identity;
pub mod policy;
pub mod providers;
pub mod template;
pub mod yaml;

pub use catalog::{Catalog, CatalogBuilder, CatalogFormat};
pub use category::{Categories, CategoryPrefixes, MISC_CATEGORY};
pub use errors::{GeneratorError, Result};
pub use generator::{
    role_name, GenerationSummary, Generator, GeneratorConfig, RenderedDocument,
};
pub use identity::{Identity, IdentityKind, NamingConvention, IDENTITY_NAME_PATTERN};
pub use policy::{Condition, Effect, Policy, PolicyGroup, PolicyGroupBuilder};
pub use template::{substitute, Parameters, Templates};
pub use yaml::{policies_to_yaml, ToYaml};
