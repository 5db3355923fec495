//! Output formatting for lookup results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::orchestrator::{DependencyReport, OrchestratorResult};
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Minimal output
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with additional information
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        Self {
            format,
            verbosity,
            color: true,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: true,
        }
    }

    /// Disable colors (builder pattern)
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write the orchestrator result
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write a single dependency's report
    fn format_dependency(
        &self,
        report: &DependencyReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}
