//! Command-line entry point for the IAM profile generator.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;

use iam_profile_generator_core::{
    policies_to_yaml, role_name, substitute, Catalog, Generator, GeneratorConfig, GeneratorError,
    IdentityKind, Parameters, Policy, Templates,
};

/// Exit status when a human identity name breaks the naming convention
const EXIT_NAMING_CONVENTION: u8 = 1;

/// Exit status for every other failure
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "iam-profile-generator")]
#[command(version)]
#[command(about = "Generate per-identity IAM CloudFormation documents from a policy catalog")]
struct Cli {
    /// Catalog file (.toml or .json). Defaults to the embedded catalog.
    #[arg(long, global = true, env = "IAM_PROFILE_GENERATOR_CATALOG")]
    catalog: Option<PathBuf>,

    /// Directory holding the three document templates. Defaults to the embedded set.
    #[arg(long, global = true, env = "IAM_PROFILE_GENERATOR_TEMPLATES")]
    templates: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render and write every profile and service stack.
    Generate {
        /// Root directory for generated documents.
        #[arg(long, short, default_value = ".", env = "IAM_PROFILE_GENERATOR_OUTPUT_DIR")]
        output_dir: PathBuf,
    },
    /// Validate the catalog, templates and identity names without writing anything.
    Check,
    /// Print the flattened statements of one identity.
    Show {
        /// Human or service identity name.
        identity: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = ShowFormat::Yaml)]
        format: ShowFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Yaml,
    Json,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_generator(cli: &Cli, config: GeneratorConfig) -> Result<Generator> {
    let catalog = Catalog::load(cli.catalog.as_deref()).context("Failed to load catalog")?;
    let templates =
        Templates::load(cli.templates.as_deref()).context("Failed to load templates")?;
    Ok(Generator::new(catalog, templates, config)?)
}

fn show(generator: &Generator, name: &str, format: ShowFormat) -> Result<String> {
    let identity = generator
        .catalog()
        .identity(name)
        .with_context(|| format!("Unknown identity {}", name))?;
    let policies: Vec<&Policy> = identity.group.flatten().iter().map(|p| &**p).collect();
    debug!(
        "{} identity {} has {} statements from group {}",
        identity.kind,
        identity.name,
        policies.len(),
        identity.group_name
    );

    let text = match format {
        ShowFormat::Yaml => policies_to_yaml(policies),
        ShowFormat::Json => {
            serde_json::to_string_pretty(&policies).context("Failed to serialize statements")?
        }
    };
    Ok(match identity.kind {
        IdentityKind::Human => substitute(
            &text,
            &Parameters::new().with("RoleName", role_name(&identity.name)),
        ),
        IdentityKind::Service => text,
    })
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Generate { output_dir } => {
            let config = GeneratorConfig::default().with_output_dir(output_dir);
            let summary = load_generator(cli, config)?.run()?;
            println!(
                "Generated {} profiles and {} service stacks",
                summary.profiles, summary.service_stacks
            );
        }
        Command::Check => {
            let generator = load_generator(cli, GeneratorConfig::default())?;
            generator.check()?;
            println!(
                "Catalog is valid: {} humans, {} services",
                generator.catalog().humans().count(),
                generator.catalog().services().count()
            );
        }
        Command::Show { identity, format } => {
            let generator = load_generator(cli, GeneratorConfig::default())?;
            println!("{}", show(&generator, identity, *format)?.trim_start_matches('\n'));
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GeneratorError>() {
        Some(GeneratorError::NamingConvention { .. }) => EXIT_NAMING_CONVENTION,
        _ => EXIT_FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
