//! CLI argument parsing module for deplookup

use crate::settings::parse_duration;
use clap::Parser;
use std::path::PathBuf;

/// Validate a duration and keep its original spelling
fn parse_age(s: &str) -> Result<String, String> {
    parse_duration(s)
        .map(|_| s.trim().to_string())
        .map_err(|e| e.to_string())
}

/// Reject a zero concurrency limit
fn parse_concurrency(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Dependency update lookup
#[derive(Parser, Debug, Clone)]
#[command(
    name = "deplookup",
    version,
    about = "Find the updates each dependency can receive"
)]
pub struct CliArgs {
    /// JSON file with an array of dependency lookup configs
    pub deps_file: PathBuf,

    /// Serve releases from a JSON fixture file instead of the registries
    #[arg(long, value_name = "FIXTURE_FILE")]
    pub releases: Option<PathBuf>,

    /// Settings file (default: deplookup.toml in the working directory, if present)
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum number of lookups in flight
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    // Age filter
    /// Only propose versions released at least this long ago (e.g., 12h, 2w, 10d, 1m)
    #[arg(long, value_parser = parse_age)]
    pub age: Option<String>,
}

impl CliArgs {
    /// Whether a progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}
