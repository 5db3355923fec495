//! Batch lookup orchestrator
//!
//! This module provides:
//! - Settings defaults and package rules merged into every dependency
//! - Parallel lookups with a concurrency limit
//! - Results in input order, whatever order lookups finish in
//! - Error handling with partial continuation

use crate::domain::{LookupConfig, PackageRule, RuleOverrides, SkipReason, UpdateResult};
use crate::error::LookupError;
use crate::lookup::LookupEngine;
use crate::progress::Progress;
use crate::settings::Settings;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// Default concurrency limit for lookups
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Outcome of one dependency's lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The lookup ran to completion (possibly with a skip reason)
    Completed(UpdateResult),
    /// A registry could not be reached
    ExternalHostFailed(String),
}

/// Lookup outcome together with the dependency it belongs to
#[derive(Debug, Clone)]
pub struct DependencyReport {
    /// The effective config the lookup ran with
    pub config: LookupConfig,
    pub outcome: LookupOutcome,
}

impl DependencyReport {
    /// Returns the result if the lookup completed
    pub fn result(&self) -> Option<&UpdateResult> {
        match &self.outcome {
            LookupOutcome::Completed(result) => Some(result),
            LookupOutcome::ExternalHostFailed(_) => None,
        }
    }
}

/// Result of running the orchestrator
#[derive(Debug, Default)]
pub struct OrchestratorResult {
    /// One report per input dependency, in input order
    pub reports: Vec<DependencyReport>,
}

impl OrchestratorResult {
    /// Total number of proposed updates
    pub fn total_updates(&self) -> usize {
        self.reports
            .iter()
            .filter_map(DependencyReport::result)
            .map(|r| r.updates.len())
            .sum()
    }

    /// Number of lookups that failed on a registry
    pub fn external_failures(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, LookupOutcome::ExternalHostFailed(_)))
            .count()
    }

    /// Returns true if any lookup failed on a registry
    pub fn has_external_failures(&self) -> bool {
        self.external_failures() > 0
    }
}

/// Errors that abort a whole run
#[derive(Debug)]
pub enum OrchestratorError {
    /// A dependency's configuration can never be looked up
    ConfigValidation { dependency: String, message: String },
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::ConfigValidation {
                dependency,
                message,
            } => write!(f, "Invalid configuration for {}: {}", dependency, message),
        }
    }
}

impl std::error::Error for OrchestratorError {}

/// Orchestrator for looking up a batch of dependencies
pub struct Orchestrator {
    engine: Arc<LookupEngine>,
    settings: Settings,
    /// Semaphore for concurrency control
    semaphore: Arc<Semaphore>,
    /// `minimumReleaseAge` forced onto every dependency
    age_override: Option<String>,
}

impl Orchestrator {
    /// Create a new orchestrator; concurrency comes from the settings
    pub fn new(engine: LookupEngine, settings: Settings) -> Self {
        let concurrency = settings.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        Self {
            engine: Arc::new(engine),
            settings,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            age_override: None,
        }
    }

    /// Set the concurrency limit (builder pattern)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        self
    }

    /// Force `minimumReleaseAge` for every dependency (builder pattern)
    pub fn with_minimum_release_age(mut self, age: impl Into<String>) -> Self {
        self.age_override = Some(age.into());
        self
    }

    /// Build the config a dependency entry is looked up with
    pub fn effective_config(&self, entry: &LookupConfig) -> LookupConfig {
        let mut config = self.settings.apply_to(entry);
        if let Some(age) = &self.age_override {
            // A trailing catch-all rule wins over every other rule
            config.package_rules.push(PackageRule {
                overrides: RuleOverrides {
                    minimum_release_age: Some(age.clone()),
                    ..RuleOverrides::default()
                },
                ..PackageRule::default()
            });
        }
        config
    }

    /// Look up every entry, showing progress if enabled
    pub async fn run(
        &self,
        entries: &[LookupConfig],
        show_progress: bool,
    ) -> Result<OrchestratorResult, OrchestratorError> {
        let mut progress = Progress::new(show_progress);
        progress.start(entries.len() as u64, "Looking up dependencies");

        let configs: Vec<LookupConfig> =
            entries.iter().map(|e| self.effective_config(e)).collect();
        let mut handles = Vec::with_capacity(configs.len());
        for config in &configs {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&self.semaphore);
            let progress = progress.clone();
            let config = config.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                progress.set_message(&config.dep_name);
                let result = engine.lookup_updates(&config).await;
                progress.inc();
                result
            }));
        }

        let mut reports = Vec::with_capacity(configs.len());
        let mut failure = None;
        for (handle, config) in handles.iter_mut().zip(configs) {
            if failure.is_some() {
                handle.abort();
                continue;
            }
            let outcome = match handle.await {
                Ok(Ok(result)) => LookupOutcome::Completed(result),
                Ok(Err(LookupError::ExternalHost(err))) => {
                    warn!(dependency = %config.dep_name, error = %err, "registry lookup failed");
                    LookupOutcome::ExternalHostFailed(err.to_string())
                }
                Ok(Err(LookupError::ConfigValidation { message })) => {
                    failure = Some(OrchestratorError::ConfigValidation {
                        dependency: config.dep_name.clone(),
                        message,
                    });
                    continue;
                }
                Ok(Err(err)) => {
                    error!(dependency = %config.dep_name, error = %err, "lookup failed");
                    LookupOutcome::Completed(UpdateResult::skip(SkipReason::InternalError))
                }
                Err(join_error) => {
                    error!(dependency = %config.dep_name, error = %join_error, "lookup task failed");
                    LookupOutcome::Completed(UpdateResult::skip(SkipReason::InternalError))
                }
            };
            reports.push(DependencyReport { config, outcome });
        }
        progress.finish_and_clear();

        match failure {
            Some(err) => Err(err),
            None => Ok(OrchestratorResult { reports }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DatasourceRegistry, FixtureDatasource};
    use crate::domain::{DependencyMetadata, Release};

    fn orchestrator(settings: Settings) -> Orchestrator {
        let provider = FixtureDatasource::new("npm")
            .with_package(
                "a",
                DependencyMetadata::from_releases(vec![
                    Release::new("1.0.0"),
                    Release::new("1.1.0"),
                ]),
            )
            .with_package(
                "b",
                DependencyMetadata::from_releases(vec![Release::new("2.0.0")]),
            )
            .with_failure("flaky");
        let registry = DatasourceRegistry::new().with_provider(Arc::new(provider));
        Orchestrator::new(LookupEngine::new(registry), settings)
    }

    fn dep(name: &str, value: &str) -> LookupConfig {
        LookupConfig::new(name, "npm").with_current_value(value)
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let entries = vec![dep("b", "^2.0.0"), dep("a", "^1.0.0"), dep("c", "^1.0.0")];
        let result = orchestrator(Settings::default())
            .with_concurrency(2)
            .run(&entries, false)
            .await
            .unwrap();

        let names: Vec<&str> = result
            .reports
            .iter()
            .map(|r| r.config.dep_name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(result.total_updates(), 1);
        assert!(!result.has_external_failures());
    }

    #[tokio::test]
    async fn test_external_failure_does_not_stop_batch() {
        let entries = vec![dep("flaky", "^1.0.0"), dep("a", "^1.0.0")];
        let result = orchestrator(Settings::default())
            .run(&entries, false)
            .await
            .unwrap();

        assert_eq!(result.external_failures(), 1);
        assert!(matches!(
            result.reports[0].outcome,
            LookupOutcome::ExternalHostFailed(_)
        ));
        assert_eq!(result.reports[1].result().unwrap().updates.len(), 1);
    }

    #[tokio::test]
    async fn test_config_validation_aborts() {
        let entries = vec![dep("a", "^1.0.0").with_versioning("maven")];
        let err = orchestrator(Settings::default())
            .run(&entries, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid configuration for a"));
    }

    #[test]
    fn test_age_override_is_last_rule() {
        let settings = Settings {
            package_rules: vec![PackageRule {
                overrides: RuleOverrides {
                    minimum_release_age: Some("1d".to_string()),
                    ..RuleOverrides::default()
                },
                ..PackageRule::default()
            }],
            ..Settings::default()
        };
        let orchestrator = orchestrator(settings).with_minimum_release_age("2w");
        let config = orchestrator.effective_config(&dep("a", "^1.0.0"));
        assert_eq!(config.package_rules.len(), 2);
        assert_eq!(
            config.package_rules[1]
                .overrides
                .minimum_release_age
                .as_deref(),
            Some("2w")
        );
    }

    #[test]
    fn test_orchestrator_error_display() {
        let err = OrchestratorError::ConfigValidation {
            dependency: "lodash".to_string(),
            message: "unknown versioning 'maven'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration for lodash: unknown versioning 'maven'"
        );
    }
}
