//! Text output formatter for human-readable display
//!
//! This module provides:
//! - One block per dependency with its proposed updates
//! - Update type indication with colors
//! - Warnings, and skip reasons in verbose mode
//! - Summary with a breakdown by update type

use crate::domain::{Update, UpdateType};
use crate::orchestrator::{DependencyReport, LookupOutcome, OrchestratorResult};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn colored_label(update_type: UpdateType) -> String {
        let label = update_type.as_str();
        match update_type {
            UpdateType::Major | UpdateType::Rollback => label.red().bold().to_string(),
            UpdateType::Minor | UpdateType::Replacement => label.yellow().to_string(),
            UpdateType::Patch | UpdateType::Bump => label.green().to_string(),
            UpdateType::Pin | UpdateType::PinDigest | UpdateType::Digest => {
                label.cyan().to_string()
            }
        }
    }

    /// Target shown after the arrow: new value, plus version or digest details
    fn target(update: &Update) -> String {
        let mut target = match (&update.new_name, &update.new_value) {
            (Some(name), Some(value)) => format!("{}@{}", name, value),
            (Some(name), None) => name.clone(),
            (None, Some(value)) => value.clone(),
            (None, None) => update.new_version.clone().unwrap_or_default(),
        };
        if let Some(version) = &update.new_version {
            if update.new_value.as_deref() != Some(version.as_str()) {
                target.push_str(&format!(" ({})", version));
            }
        }
        if let Some(digest) = update.resolved_digest() {
            target.push_str(&format!(" @{}", short_digest(digest)));
        }
        target
    }

    fn format_update_line(
        &self,
        current: &str,
        update: &Update,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let target = Self::target(update);
        let date = update
            .release_timestamp
            .map(|d| format!(" ({})", d.format("%Y/%m/%d %H:%M")))
            .unwrap_or_default();
        let mut notes = Vec::new();
        if update.is_lockfile_update {
            notes.push("lockfile".to_string());
        }
        if update.pending_checks {
            notes.push("pending checks".to_string());
        }
        if !update.pending_versions.is_empty() {
            notes.push(format!("pending: {}", update.pending_versions.join(", ")));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join("; "))
        };

        if self.color {
            writeln!(
                writer,
                "    {} {} {} [{}]{}{}",
                current.dimmed(),
                "→".dimmed(),
                target.bright_white().bold(),
                Self::colored_label(update.update_type),
                date.dimmed(),
                notes.dimmed()
            )
        } else {
            writeln!(
                writer,
                "    {} -> {} [{}]{}{}",
                current,
                target,
                update.update_type,
                date,
                notes
            )
        }
    }

    /// Count updates by update type
    fn count_by_update_type(&self, result: &OrchestratorResult) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for report in &result.reports {
            if let Some(res) = report.result() {
                for update in &res.updates {
                    *counts.entry(update.update_type.as_str()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    fn format_summary(
        &self,
        result: &OrchestratorResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let updates = result.total_updates();
        let skipped = result
            .reports
            .iter()
            .filter_map(DependencyReport::result)
            .filter(|r| r.is_skip())
            .count();
        let failed = result.external_failures();
        let plural = |n: usize, word: &str| {
            if n == 1 {
                format!("{} {}", n, word)
            } else {
                format!("{} {}s", n, word)
            }
        };

        let line = format!(
            "{}, {} skipped, {} failed",
            plural(updates, "update"),
            skipped,
            failed
        );
        if self.color {
            writeln!(writer, "{}", line.bold())?;
        } else {
            writeln!(writer, "{}", line)?;
        }

        if self.verbosity != Verbosity::Quiet {
            let counts = self.count_by_update_type(result);
            if !counts.is_empty() {
                let breakdown: Vec<String> = counts
                    .iter()
                    .map(|(kind, n)| format!("{}: {}", kind, n))
                    .collect();
                writeln!(writer, "  {}", breakdown.join(", "))?;
            }
        }
        Ok(())
    }
}

fn short_digest(digest: &str) -> &str {
    let hex = digest.split_once(':').map_or(digest, |(_, hex)| hex);
    hex.get(..12).unwrap_or(hex)
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if result.reports.is_empty() {
            return writeln!(writer, "No dependencies to look up");
        }

        for report in &result.reports {
            self.format_dependency(report, writer)?;
        }
        self.format_summary(result, writer)
    }

    fn format_dependency(
        &self,
        report: &DependencyReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let config = &report.config;
        let current = config
            .current_value
            .as_deref()
            .or(config.locked_version.as_deref())
            .unwrap_or("-");

        let res = match &report.outcome {
            LookupOutcome::ExternalHostFailed(message) => {
                if self.color {
                    writeln!(
                        writer,
                        "{} {}",
                        config.dep_name.bold(),
                        format!("(lookup failed: {})", message).red()
                    )?;
                } else {
                    writeln!(writer, "{} (lookup failed: {})", config.dep_name, message)?;
                }
                return Ok(());
            }
            LookupOutcome::Completed(res) => res,
        };

        let verbose = self.verbosity == Verbosity::Verbose;
        if res.updates.is_empty() && res.warnings.is_empty() && !verbose {
            return Ok(());
        }

        let header = format!("{} ({})", config.dep_name, config.datasource);
        if self.color {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }

        for update in &res.updates {
            self.format_update_line(current, update, writer)?;
        }
        for warning in &res.warnings {
            if self.color {
                writeln!(writer, "    {} {}", "warning:".yellow(), warning.message)?;
            } else {
                writeln!(writer, "    warning: {}", warning.message)?;
            }
        }
        if verbose {
            if let Some(reason) = res.skip_reason {
                let line = format!("    skipped ({})", reason);
                if self.color {
                    writeln!(writer, "{}", line.dimmed())?;
                } else {
                    writeln!(writer, "{}", line)?;
                }
            } else if res.updates.is_empty() {
                writeln!(writer, "    up to date")?;
            }
            if let Some(message) = &res.deprecation_message {
                writeln!(writer, "    deprecated: {}", message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LookupConfig, SkipReason, UpdateResult};

    fn report(name: &str, value: &str, res: UpdateResult) -> DependencyReport {
        DependencyReport {
            config: LookupConfig::new(name, "npm").with_current_value(value),
            outcome: LookupOutcome::Completed(res),
        }
    }

    fn minor_update() -> Update {
        let mut update = Update::new(UpdateType::Minor).with_new_value(Some("^1.2.0".to_string()));
        update.new_version = Some("1.2.0".to_string());
        update
    }

    fn render(formatter: &TextFormatter, result: &OrchestratorResult) -> String {
        let mut output = Vec::new();
        formatter.format(result, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_format_update_plain() {
        let mut res = UpdateResult::new();
        res.updates.push(minor_update());
        let result = OrchestratorResult {
            reports: vec![report("lodash", "^1.0.0", res)],
        };

        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &result);
        assert!(output.contains("lodash (npm)"));
        assert!(output.contains("^1.0.0 -> ^1.2.0 (1.2.0) [minor]"));
        assert!(output.contains("1 update, 0 skipped, 0 failed"));
        assert!(output.contains("minor: 1"));
    }

    #[test]
    fn test_up_to_date_hidden_unless_verbose() {
        let result = OrchestratorResult {
            reports: vec![report("react", "^18.0.0", UpdateResult::new())],
        };

        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &result);
        assert!(!output.contains("react"));

        let output = render(&TextFormatter::with_color(Verbosity::Verbose, false), &result);
        assert!(output.contains("react (npm)"));
        assert!(output.contains("up to date"));
    }

    #[test]
    fn test_skip_reason_in_verbose() {
        let result = OrchestratorResult {
            reports: vec![report("a", "1.0.0", UpdateResult::skip(SkipReason::IsPinned))],
        };
        let output = render(&TextFormatter::with_color(Verbosity::Verbose, false), &result);
        assert!(output.contains("skipped (is-pinned)"));
        assert!(output.contains("0 updates, 1 skipped, 0 failed"));
    }

    #[test]
    fn test_warning_and_failure() {
        let mut res = UpdateResult::new();
        res.warn("a", "Failed to look up dependency a");
        let result = OrchestratorResult {
            reports: vec![
                report("a", "^1.0.0", res),
                DependencyReport {
                    config: LookupConfig::new("b", "npm"),
                    outcome: LookupOutcome::ExternalHostFailed("timeout".to_string()),
                },
            ],
        };
        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &result);
        assert!(output.contains("warning: Failed to look up dependency a"));
        assert!(output.contains("b (lookup failed: timeout)"));
        assert!(output.contains("1 failed"));
    }

    #[test]
    fn test_target_with_digest_and_replacement() {
        let mut digest = Update::new(UpdateType::Digest).with_new_value(Some("20".to_string()));
        digest.new_digest = Some(crate::domain::NewDigest::Resolved(
            "sha256:0123456789abcdef".to_string(),
        ));
        assert_eq!(TextFormatter::target(&digest), "20 @0123456789ab");

        let mut replacement =
            Update::new(UpdateType::Replacement).with_new_value(Some("^2.0.0".to_string()));
        replacement.new_name = Some("new-pkg".to_string());
        assert_eq!(TextFormatter::target(&replacement), "new-pkg@^2.0.0");
    }

    #[test]
    fn test_empty_result() {
        let output = render(
            &TextFormatter::new(Verbosity::Normal),
            &OrchestratorResult::default(),
        );
        assert!(output.contains("No dependencies to look up"));
    }
}
