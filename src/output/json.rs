//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of lookup results
//! - One entry per dependency, in input order

use crate::domain::UpdateResult;
use crate::orchestrator::{DependencyReport, LookupOutcome, OrchestratorResult};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Summary statistics
    summary: JsonSummary,
    /// Per-dependency results
    dependencies: Vec<JsonDependency<'a>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    dependencies: usize,
    updates: usize,
    skipped: usize,
    failed: usize,
}

/// JSON representation of one dependency
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDependency<'a> {
    dep_name: &'a str,
    datasource: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a UpdateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl JsonFormatter {
    fn dependency_to_json<'a>(&self, report: &'a DependencyReport) -> JsonDependency<'a> {
        let (result, error) = match &report.outcome {
            LookupOutcome::Completed(res) => (Some(res), None),
            LookupOutcome::ExternalHostFailed(message) => (None, Some(message.as_str())),
        };
        JsonDependency {
            dep_name: &report.config.dep_name,
            datasource: &report.config.datasource,
            current_value: report.config.current_value.as_deref(),
            locked_version: report.config.locked_version.as_deref(),
            result,
            error,
        }
    }

    /// Up-to-date dependencies are only listed in verbose mode
    fn is_listed(&self, report: &DependencyReport) -> bool {
        self.verbosity == Verbosity::Verbose
            || report.result().map_or(true, |res| {
                res.has_updates() || !res.warnings.is_empty() || res.is_skip()
            })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            summary: JsonSummary {
                dependencies: result.reports.len(),
                updates: result.total_updates(),
                skipped: result
                    .reports
                    .iter()
                    .filter_map(DependencyReport::result)
                    .filter(|r| r.is_skip())
                    .count(),
                failed: result.external_failures(),
            },
            dependencies: result
                .reports
                .iter()
                .filter(|r| self.is_listed(r))
                .map(|r| self.dependency_to_json(r))
                .collect(),
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }

    fn format_dependency(
        &self,
        report: &DependencyReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.dependency_to_json(report))?;
        writeln!(writer)
    }
}
