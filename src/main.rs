//! deplookup - dependency update lookup CLI tool
//!
//! Reads a list of dependencies and reports the updates each one can
//! receive, based on registry releases and the configured update policy.

use anyhow::Context;
use clap::Parser;
use deplookup::cli::CliArgs;
use deplookup::datasource::{load_fixtures, DatasourceRegistry, HttpClient};
use deplookup::domain::LookupConfig;
use deplookup::error::SettingsError;
use deplookup::logging;
use deplookup::lookup::LookupEngine;
use deplookup::orchestrator::Orchestrator;
use deplookup::output::{create_formatter, OutputConfig};
use deplookup::settings::Settings;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init(args.verbose, args.quiet);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Read the dependency list
fn load_dependencies(path: &Path) -> Result<Vec<LookupConfig>, SettingsError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SettingsError::read_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| SettingsError::json_parse_error(path, e.to_string()))
}

/// Build the datasource registry: fixtures if given, registries otherwise
fn build_registry(args: &CliArgs) -> anyhow::Result<DatasourceRegistry> {
    match &args.releases {
        Some(path) => {
            let fixtures = load_fixtures(path)?;
            Ok(fixtures
                .into_iter()
                .fold(DatasourceRegistry::new(), |registry, fixture| {
                    registry.with_provider(Arc::new(fixture))
                }))
        }
        None => {
            let client = HttpClient::new().context("failed to create HTTP client")?;
            Ok(DatasourceRegistry::with_defaults(client))
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        deps_file = %args.deps_file.display(),
        "starting"
    );

    let settings = Settings::discover(args.config.as_deref())?;
    let dependencies = load_dependencies(&args.deps_file)?;
    let registry = build_registry(&args)?;
    debug!(datasources = ?registry.ids(), dependencies = dependencies.len(), "loaded inputs");

    let mut orchestrator = Orchestrator::new(LookupEngine::new(registry), settings);
    if let Some(concurrency) = args.concurrency {
        orchestrator = orchestrator.with_concurrency(concurrency);
    }
    if let Some(age) = &args.age {
        orchestrator = orchestrator.with_minimum_release_age(age.clone());
    }

    let result = orchestrator
        .run(&dependencies, args.show_progress())
        .await?;

    // Create output formatter based on CLI options
    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    let formatter = create_formatter(output_config);

    // Output results
    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    if result.has_external_failures() {
        // Partial success - some registries could not be reached
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
