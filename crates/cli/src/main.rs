mod demo;

use anyhow::Context;
use clap::Parser;
use endpoint_openapi::{OpenApiConfig, OpenApiGenerator, OutputFormat};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "endpoint-openapi")]
#[command(about = "Write the OpenAPI document of the sample service")]
struct Cli {
    /// Output file path (defaults to the configured path)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// TOML file with document metadata and output settings
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format (json, yaml); inferred from the extension otherwise
    #[arg(long, short)]
    format: Option<OutputFormat>,

    /// API title
    #[arg(long)]
    title: Option<String>,

    /// API version
    #[arg(long)]
    api_version: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OpenApiConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => OpenApiConfig::new("Service", "1.0").with_description("Description"),
    };
    if let Some(title) = cli.title {
        config.info.title = title;
    }
    if let Some(version) = cli.api_version {
        config.info.version = version;
    }
    if let Some(format) = cli.format {
        config = config.with_output_format(format);
    }
    if let Some(output) = cli.output {
        config = config.with_output_path(output);
    }

    let endpoint = demo::endpoint_config().context("Invalid endpoint declaration")?;
    let mut generator = OpenApiGenerator::new(config).with_endpoint(endpoint);

    let spec = generator.generate().context("OpenAPI generation failed")?;
    info!(
        paths = spec.paths.len(),
        schemas = spec.components.as_ref().map_or(0, |c| c.schemas.len()),
        "generated OpenAPI document"
    );

    let path = generator.write().context("Failed to write OpenAPI document")?;
    info!(path = %path.display(), "OpenAPI file generated");

    Ok(())
}
