use clap::{Parser, Subcommand, ValueEnum};
use octofhir_fhirelement::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fhir-element")]
#[command(about = "Build, inspect and validate schema-driven FHIR elements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a FHIR JSON resource
    Validate {
        /// Path to the resource file
        #[arg(short, long)]
        input: PathBuf,
        /// Reject the resource while decoding if it has rule violations
        #[arg(long)]
        strict: bool,
        /// Model configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List registered schemas
    Schemas,
    /// Show the fields of one schema
    Describe {
        /// Type name (e.g. ValueSet.Compose)
        #[arg(short, long = "type")]
        type_name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            input,
            strict,
            config,
            format,
        } => {
            let valid = validate_resource(&input, strict, config.as_ref(), format).await?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Schemas => list_schemas()?,
        Commands::Describe { type_name } => describe_schema(&type_name)?,
    }

    Ok(())
}

async fn validate_resource(
    input: &PathBuf,
    strict: bool,
    config_path: Option<&PathBuf>,
    format: OutputFormat,
) -> std::result::Result<bool, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => ModelConfig::from_json_file(path)?,
        None => ModelConfig::default(),
    };
    if strict {
        config = config.with_strict_build(true);
    }
    let model = FhirModelBuilder::new().config(config).build()?;

    let content = std::fs::read_to_string(input)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;

    let result = match model.resource_from_json(&json) {
        Ok(element) => model.validate_async(&element).await,
        Err(FhirElementError::InvalidElement { result, .. }) => *result,
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if result.issues.is_empty() {
                println!("✅ Validation passed");
            } else if result.is_valid {
                println!(
                    "✅ Validation passed with {} warning(s), {} information message(s):\n",
                    result.warning_count, result.info_count
                );
            } else {
                println!(
                    "❌ Validation failed with {} rule violation(s):\n",
                    result.rule_count
                );
            }
            for issue in &result.issues {
                let label = match issue.severity {
                    Severity::Rule => "ERROR",
                    Severity::Warning => "WARN",
                    Severity::Information => "INFO",
                };
                println!("  {} [{}]: {}", label, issue.code, issue.message);
                println!("    at: {}", issue.path);
            }
        }
    }

    Ok(result.is_valid)
}

fn list_schemas() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let registry = SchemaRegistry::global()?;
    let resources = registry.resource_types();

    println!("Registered schemas: {}", registry.len());
    println!("==================");
    for type_name in registry.type_names() {
        if resources.contains(&type_name) {
            println!("  {type_name} (resource)");
        } else {
            println!("  {type_name}");
        }
    }

    Ok(())
}

fn describe_schema(type_name: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let registry = SchemaRegistry::global()?;
    let schema = registry.get(type_name)?;

    println!("Schema Information:");
    println!("==================");
    println!("Type: {}", schema.type_name());
    println!("Path: {}", schema.path());
    println!("Kind: {:?}", schema.kind());

    println!("\nFields: {}", schema.fields().len());
    for field in schema.fields() {
        let name = if field.is_choice() {
            format!("{}[x]", field.name)
        } else {
            field.name.clone()
        };
        print!("  - {} {} {}", name, field.cardinality, field.kinds_display());
        if !field.target_types.is_empty() {
            print!(" -> ({})", field.target_types.join(" | "));
        }
        if let Some(binding) = &field.binding {
            print!(" [{} {}]", binding.strength, binding.value_set);
        }
        println!();
    }

    Ok(())
}
