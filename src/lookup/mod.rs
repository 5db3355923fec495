//! Dependency update lookup
//!
//! This module provides the [`LookupEngine`], which works out every update a
//! single dependency can receive:
//! 1. Resolve the versioning scheme and validate the current value
//! 2. Fetch releases and resolve the current version
//! 3. Filter candidates and group them into buckets
//! 4. Gate each bucket and generate one update per bucket
//! 5. Attach digests and drop updates that change nothing
//!
//! Expected abnormal outcomes are reported through `skip_reason` and
//! `warnings`. Only configuration and registry errors are returned as errors.

mod bucket;
mod checks;
mod current;
mod filter;
mod generate;
mod rollback;
mod strategy;

pub use bucket::{assign_buckets, get_bucket};
pub use checks::{GateOutcome, InternalChecks, ReleaseGate, ResultConfig};
pub use current::{current_value_as_version, resolve_current_version, resolve_with_fallback};
pub use filter::{filter_versions, parse_version_regex};
pub use generate::generate_update;
pub use rollback::get_rollback_update;
pub use strategy::{DefaultRangeStrategy, RangeStrategyResolver};

use crate::datasource::{filter_by_constraints, DatasourceRegistry, ReleaseProvider};
use crate::domain::{
    apply_package_rules, DependencyMetadata, LookupConfig, NewDigest, RangeStrategy, Release,
    SkipReason, Update, UpdateResult, UpdateType,
};
use crate::error::LookupError;
use crate::versioning::{self, NewValueRequest, Versioning};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Looks up updates for single dependencies
#[derive(Clone)]
pub struct LookupEngine {
    datasources: DatasourceRegistry,
    checks: Arc<dyn ReleaseGate>,
    range_strategy: Arc<dyn RangeStrategyResolver>,
}

impl LookupEngine {
    /// Create an engine with the default gate and range-strategy resolver
    pub fn new(datasources: DatasourceRegistry) -> Self {
        Self {
            datasources,
            checks: Arc::new(InternalChecks::new()),
            range_strategy: Arc::new(DefaultRangeStrategy),
        }
    }

    /// Set the release gate (builder pattern)
    pub fn with_checks(mut self, checks: Arc<dyn ReleaseGate>) -> Self {
        self.checks = checks;
        self
    }

    /// Set the range-strategy resolver (builder pattern)
    pub fn with_range_strategy(mut self, resolver: Arc<dyn RangeStrategyResolver>) -> Self {
        self.range_strategy = resolver;
        self
    }

    /// Look up every update `config` can receive.
    ///
    /// Config-validation and registry errors are returned; any other failure,
    /// panics included, yields the partial result with `internal-error`.
    pub async fn lookup_updates(&self, config: &LookupConfig) -> Result<UpdateResult, LookupError> {
        trace!(dependency = %config.dep_name, current_value = ?config.current_value, "lookup_updates");
        let mut res = UpdateResult::new();
        let outcome = AssertUnwindSafe(self.run(config, &mut res))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => return Ok(res),
            Ok(Err(err)) if err.is_propagated() => return Err(err),
            Ok(Err(err)) => err.to_string(),
            Err(panic) => format!("panic: {}", panic_message(panic.as_ref())),
        };
        error!(
            dependency = %config.dep_name,
            datasource = %config.datasource,
            current_value = ?config.current_value,
            current_digest = ?config.current_digest,
            locked_version = ?config.locked_version,
            follow_tag = ?config.follow_tag,
            pin_digests = config.pin_digests,
            rollback_prs = config.rollback_prs,
            is_vulnerability_alert = config.is_vulnerability_alert,
            error = %failure,
            "lookup_updates error"
        );
        res.skip_reason = Some(SkipReason::InternalError);
        Ok(res)
    }

    async fn run(&self, input: &LookupConfig, res: &mut UpdateResult) -> Result<(), LookupError> {
        let dep_name = input.dep_name.as_str();
        let Some(datasource) = self.datasources.get(&input.datasource) else {
            debug!(dependency = %dep_name, datasource = %input.datasource, "unknown datasource");
            res.skip_reason = Some(SkipReason::InvalidConfig);
            return Ok(());
        };
        if dep_name.is_empty() {
            res.skip_reason = Some(SkipReason::InvalidConfig);
            return Ok(());
        }

        let mut config = apply_package_rules(input, None)?;
        let versioning_id = config
            .versioning
            .clone()
            .unwrap_or_else(|| datasource.default_versioning().to_string());
        let versioning = versioning::get(&versioning_id).ok_or_else(|| {
            LookupError::config_validation(format!("unknown versioning '{}'", versioning_id))
        })?;
        res.versioning = versioning_id;

        let current_value = config.current_value.clone();
        let current_value = current_value.as_deref();
        let locked_version = config.locked_version.clone();
        let locked_version = locked_version.as_deref();
        let unconstrained = config.is_unconstrained();
        let is_valid = current_value.is_some_and(|value| versioning.is_valid(value));
        let mut dependency: Option<DependencyMetadata> = None;

        if unconstrained || is_valid {
            if !config.update_pinned_dependencies
                && current_value.is_some_and(|value| versioning.is_single_version(value))
            {
                res.skip_reason = Some(SkipReason::IsPinned);
                return Ok(());
            }

            config = config.merge_constraints();
            let Some(shared) = datasource.get_releases(&config).await? else {
                warn!(dependency = %dep_name, datasource = %config.datasource, "failed to look up dependency");
                res.warn(dep_name, format!("Failed to look up dependency {}", dep_name));
                return Ok(());
            };
            let mut fetched = DependencyMetadata::clone(&shared);
            filter_by_constraints(&mut fetched, &config.constraints);
            res.source_url = fetched.source_url.clone();
            res.source_directory = fetched.source_directory.clone();
            res.homepage = fetched.homepage.clone();
            res.changelog_url = fetched.changelog_url.clone();
            res.dependency_url = fetched.dependency_url.clone();
            res.deprecation_message = fetched.deprecation_message.clone();

            let latest_version = fetched.latest_tag().map(str::to_string);
            let mut all_versions: Vec<Release> = fetched
                .releases
                .iter()
                .filter(|r| versioning.is_version(&r.version))
                .cloned()
                .collect();
            if all_versions.is_empty() {
                debug!(dependency = %dep_name, "found no results that look like a version");
                if config.current_digest.is_none() {
                    return Ok(());
                }
            }

            config = apply_package_rules(&config.with_source_url(res.source_url.clone()), None)?;

            if let Some(tag) = config.follow_tag.clone() {
                let Some(tagged) = fetched.tags.get(&tag).cloned() else {
                    res.warn(
                        dep_name,
                        format!("Can't find version with tag {} for {}", tag, dep_name),
                    );
                    return Ok(());
                };
                // The current value survives only when it is already past the tag
                all_versions.retain(|r| {
                    r.version == tagged
                        || (current_value == Some(r.version.as_str())
                            && versioning.is_greater_than(&r.version, &tagged))
                });
            }

            let satisfying: Vec<&Release> = all_versions
                .iter()
                .filter(|r| {
                    unconstrained
                        || current_value.is_some_and(|value| versioning.matches(&r.version, value))
                })
                .collect();
            if satisfying.is_empty() {
                debug!(dependency = %dep_name, "found no satisfying versions with existing constraint");
                if config.rollback_prs {
                    let Some(rollback) = get_rollback_update(&config, &all_versions, &versioning)
                    else {
                        res.warn(
                            dep_name,
                            format!(
                                "Can't find version matching {} for {}",
                                current_value.unwrap_or_default(),
                                dep_name
                            ),
                        );
                        return Ok(());
                    };
                    res.updates.push(rollback);
                }
            }

            let mut range_strategy = self.range_strategy.resolve(&config);
            if let (Some(name), Some(version)) =
                (&fetched.replacement_name, &fetched.replacement_version)
            {
                let new_value = current_value
                    .and_then(|current_value| {
                        versioning.get_new_value(&NewValueRequest {
                            current_value,
                            range_strategy,
                            current_version: None,
                            new_version: version,
                        })
                    })
                    .unwrap_or_else(|| version.clone());
                let mut replacement = Update::new(UpdateType::Replacement)
                    .with_new_value(Some(new_value));
                replacement.new_name = Some(name.clone());
                res.updates.push(replacement);
            }

            if config.is_vulnerability_alert
                && range_strategy == RangeStrategy::UpdateLockfile
                && locked_version.is_none()
            {
                range_strategy = RangeStrategy::Bump;
            }

            let non_deprecated: Vec<Release> = fetched
                .releases
                .iter()
                .filter(|r| !r.is_deprecated)
                .cloned()
                .collect();
            let current_version = resolve_with_fallback(
                current_value,
                locked_version,
                &versioning,
                range_strategy,
                latest_version.as_deref(),
                &non_deprecated,
                &all_versions,
            )
            .or_else(|| current_value_as_version(current_value, &versioning));
            if current_version.is_none() && locked_version.is_some() {
                return Ok(());
            }
            res.current_version = current_version.clone();

            if let (Some(value), Some(version)) = (current_value, current_version.as_deref()) {
                if range_strategy == RangeStrategy::Pin && !versioning.is_single_version(value) {
                    let new_value = versioning.get_new_value(&NewValueRequest {
                        current_value: value,
                        range_strategy,
                        current_version: Some(version),
                        new_version: version,
                    });
                    let mut pin = Update::new(UpdateType::Pin).with_new_value(new_value);
                    pin.is_pin = true;
                    pin.new_version = Some(version.to_string());
                    pin.new_major = versioning.get_major(version);
                    res.updates.push(pin);
                }
            }

            let Some(current_version) = current_version.filter(|v| versioning.is_version(v))
            else {
                res.skip_reason = Some(SkipReason::InvalidVersion);
                return Ok(());
            };

            let mut filtered = filter_versions(
                &config,
                &current_version,
                latest_version.as_deref(),
                &all_versions,
                &versioning,
            )?;
            if !unconstrained {
                if let Some(value) = current_value {
                    filtered.retain(|r| versioning.is_compatible(&r.version, value));
                }
            }
            if config.is_vulnerability_alert {
                filtered.truncate(1);
            }

            let buckets = assign_buckets(&config, &current_version, filtered, &versioning);
            let result_config = ResultConfig {
                config: &config,
                current_version: &current_version,
            };
            let baseline = locked_version.unwrap_or(&current_version);
            for (bucket, mut releases) in buckets {
                releases.sort_by(|a, b| versioning.sort_versions(&a.version, &b.version));
                let outcome = self
                    .checks
                    .admit(&result_config, &versioning, &bucket, &releases)
                    .await?;
                let Some(release) = outcome.release else {
                    return Ok(());
                };

                let mut update = generate_update(
                    &config,
                    &versioning,
                    range_strategy,
                    baseline,
                    &bucket,
                    &release,
                );
                update.pending_checks = outcome.pending_checks;
                update.pending_versions = outcome
                    .pending_releases
                    .into_iter()
                    .map(|r| r.version)
                    .collect();

                if update.new_value.is_none() || update.new_value.as_deref() == current_value {
                    if locked_version.is_none() {
                        continue;
                    }
                    if range_strategy == RangeStrategy::Bump {
                        trace!(dependency = %dep_name, new_version = %release.version, "skipping bump because new value is the same");
                        continue;
                    }
                    res.is_single_version = true;
                }
                res.is_single_version = res.is_single_version
                    || update
                        .new_value
                        .as_deref()
                        .is_some_and(|value| versioning.is_single_version(value));
                res.updates.push(update);
            }
            dependency = Some(fetched);
        } else if let Some(value) = current_value {
            debug!(dependency = %dep_name, current_value = value, versioning = %res.versioning, "unsupported value");
            if !config.pin_digests && config.current_digest.is_none() {
                res.skip_reason = Some(SkipReason::InvalidValue);
            } else {
                res.skip_reason = None;
            }
        } else {
            res.skip_reason = Some(SkipReason::InvalidValue);
        }

        if let Some(locked) = locked_version {
            res.current_version = Some(locked.to_string());
            res.fixed_version = Some(locked.to_string());
        } else if let Some(value) = current_value.filter(|v| versioning.is_single_version(v)) {
            res.fixed_version = Some(value.trim_start_matches('=').to_string());
        }

        if datasource.supports_digests() {
            self.resolve_digests(
                datasource.as_ref(),
                &config,
                &versioning,
                dependency.as_ref(),
                res,
            )
            .await?;
        }

        if res.has_updates() {
            res.skip_reason = None;
        }
        let current_digest = config.current_digest.as_deref();
        res.updates.retain(|update| {
            if update.digest_unavailable() {
                return false;
            }
            update.new_value.as_deref() != current_value
                || update.is_lockfile_update
                || update.resolved_digest().is_some_and(|digest| {
                    current_digest.map_or(true, |current| !digest.starts_with(current))
                })
        });
        if config.range_strategy == RangeStrategy::InRangeOnly {
            res.updates
                .retain(|update| update.new_value.as_deref() == current_value);
        }
        Ok(())
    }

    async fn resolve_digests(
        &self,
        provider: &dyn ReleaseProvider,
        config: &LookupConfig,
        versioning: &dyn Versioning,
        dependency: Option<&DependencyMetadata>,
        res: &mut UpdateResult,
    ) -> Result<(), LookupError> {
        let current_value = config.current_value.clone();
        if config.current_digest.is_some() {
            if !config.digest_one_and_only || !res.has_updates() {
                res.updates
                    .push(Update::new(UpdateType::Digest).with_new_value(current_value));
            }
        } else if config.pin_digests
            && !res.updates.iter().any(|u| u.update_type == UpdateType::Pin)
        {
            let mut pin_digest = Update::new(UpdateType::PinDigest).with_new_value(current_value);
            pin_digest.is_pin_digest = true;
            res.updates.push(pin_digest);
        }

        if let Some(version) = &res.current_version {
            if let Some(mapped) = versioning.value_to_version(version) {
                res.current_version = Some(mapped);
            }
        }
        for update in &mut res.updates {
            if let Some(mapped) = update
                .new_version
                .as_deref()
                .and_then(|v| versioning.value_to_version(v))
            {
                update.new_version = Some(mapped);
            }
        }

        if !config.pin_digests && config.current_digest.is_none() {
            return Ok(());
        }

        let mut requests = Vec::new();
        for (index, update) in res.updates.iter_mut().enumerate() {
            if update.new_digest.is_some() {
                continue;
            }
            let known = dependency.and_then(|dep| {
                dep.releases
                    .iter()
                    .find(|r| Some(r.version.as_str()) == update.new_value.as_deref())
                    .and_then(|r| r.new_digest.clone())
            });
            match known {
                Some(digest) => update.new_digest = Some(NewDigest::Resolved(digest)),
                None => requests.push((index, update.new_value.clone())),
            }
        }

        let digests = join_all(
            requests
                .iter()
                .map(|(_, new_value)| provider.get_digest(config, new_value.as_deref())),
        )
        .await;
        for ((index, new_value), digest) in requests.iter().zip(digests) {
            let resolved = match digest? {
                Some(digest) => NewDigest::Resolved(digest),
                None => {
                    debug!(dependency = %config.dep_name, new_value = ?new_value, "could not determine new digest");
                    NewDigest::Unavailable
                }
            };
            res.updates[*index].new_digest = Some(resolved);
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FixtureDatasource;
    use async_trait::async_trait;

    fn metadata(versions: &[&str]) -> DependencyMetadata {
        DependencyMetadata::from_releases(versions.iter().map(|v| Release::new(*v)).collect())
    }

    fn engine(provider: FixtureDatasource) -> LookupEngine {
        LookupEngine::new(DatasourceRegistry::new().with_provider(Arc::new(provider)))
    }

    fn npm_engine(name: &str, versions: &[&str]) -> LookupEngine {
        engine(FixtureDatasource::new("npm").with_package(name, metadata(versions)))
    }

    struct PanickingGate;

    #[async_trait]
    impl ReleaseGate for PanickingGate {
        async fn admit(
            &self,
            _config: &ResultConfig<'_>,
            _versioning: &dyn Versioning,
            _bucket: &str,
            _sorted_releases: &[Release],
        ) -> Result<GateOutcome, LookupError> {
            panic!("gate exploded");
        }
    }

    struct RefusingGate;

    #[async_trait]
    impl ReleaseGate for RefusingGate {
        async fn admit(
            &self,
            _config: &ResultConfig<'_>,
            _versioning: &dyn Versioning,
            _bucket: &str,
            _sorted_releases: &[Release],
        ) -> Result<GateOutcome, LookupError> {
            Ok(GateOutcome::default())
        }
    }

    #[tokio::test]
    async fn test_unknown_datasource() {
        let config = LookupConfig::new("a", "pypi").with_current_value("1.0.0");
        let res = npm_engine("a", &["1.0.0"]).lookup_updates(&config).await.unwrap();
        assert_eq!(res.skip_reason, Some(SkipReason::InvalidConfig));
    }

    #[tokio::test]
    async fn test_unknown_versioning_is_config_error() {
        let config = LookupConfig::new("a", "npm")
            .with_current_value("1.0.0")
            .with_versioning("maven");
        let err = npm_engine("a", &["1.0.0"])
            .lookup_updates(&config)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::ConfigValidation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_value() {
        let config = LookupConfig::new("a", "npm").with_current_value("not a range");
        let res = npm_engine("a", &["1.0.0"]).lookup_updates(&config).await.unwrap();
        assert_eq!(res.skip_reason, Some(SkipReason::InvalidValue));
        assert!(res.updates.is_empty());

        let res = npm_engine("a", &["1.0.0"])
            .lookup_updates(&LookupConfig::new("a", "npm"))
            .await
            .unwrap();
        assert_eq!(res.skip_reason, Some(SkipReason::InvalidValue));
    }

    #[tokio::test]
    async fn test_pinned_value_is_skipped() {
        let config = LookupConfig::new("a", "npm").with_current_value("1.0.0");
        let res = npm_engine("a", &["1.0.0", "1.1.0"])
            .lookup_updates(&config)
            .await
            .unwrap();
        assert_eq!(res.skip_reason, Some(SkipReason::IsPinned));
    }

    #[tokio::test]
    async fn test_pinned_value_updates_when_allowed() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("1.0.0");
        config.update_pinned_dependencies = true;
        let res = npm_engine("a", &["1.0.0", "1.1.0", "2.0.0"])
            .lookup_updates(&config)
            .await
            .unwrap();
        let values: Vec<&str> = res
            .updates
            .iter()
            .filter_map(|u| u.new_value.as_deref())
            .collect();
        assert_eq!(values, vec!["1.1.0", "2.0.0"]);
        assert!(res.is_single_version);
        assert_eq!(res.fixed_version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_unknown_package_warns() {
        let config = LookupConfig::new("missing", "npm").with_current_value("^1.0.0");
        let res = npm_engine("a", &["1.0.0"]).lookup_updates(&config).await.unwrap();
        assert!(res.updates.is_empty());
        assert_eq!(res.warnings.len(), 1);
        assert_eq!(res.warnings[0].message, "Failed to look up dependency missing");
    }

    #[tokio::test]
    async fn test_registry_error_propagates() {
        let config = LookupConfig::new("flaky", "npm").with_current_value("^1.0.0");
        let err = engine(FixtureDatasource::new("npm").with_failure("flaky"))
            .lookup_updates(&config)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::ExternalHost(_)));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        let res = npm_engine("a", &["1.0.0", "1.2.0"])
            .with_checks(Arc::new(PanickingGate))
            .lookup_updates(&config)
            .await
            .unwrap();
        assert_eq!(res.skip_reason, Some(SkipReason::InternalError));
        assert_eq!(res.current_version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_gate_refusal_stops_lookup() {
        let config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        let res = npm_engine("a", &["1.0.0", "1.2.0", "2.0.0"])
            .with_checks(Arc::new(RefusingGate))
            .lookup_updates(&config)
            .await
            .unwrap();
        assert!(res.updates.is_empty());
        assert!(res.skip_reason.is_none());
    }

    #[tokio::test]
    async fn test_range_bump_and_major() {
        let config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        let res = npm_engine("a", &["1.0.0", "1.2.0", "2.0.0"])
            .lookup_updates(&config)
            .await
            .unwrap();

        assert_eq!(res.versioning, "npm");
        assert_eq!(res.current_version.as_deref(), Some("1.0.0"));
        assert_eq!(res.updates.len(), 2);
        assert_eq!(res.updates[0].update_type, UpdateType::Minor);
        assert_eq!(res.updates[0].new_value.as_deref(), Some("^1.2.0"));
        assert!(res.updates[0].is_bump);
        assert_eq!(res.updates[1].update_type, UpdateType::Major);
        assert_eq!(res.updates[1].new_value.as_deref(), Some("^2.0.0"));
    }

    #[tokio::test]
    async fn test_pin_strategy_adds_pin_update() {
        let config = LookupConfig::new("a", "npm")
            .with_current_value("^1.0.0")
            .with_range_strategy(RangeStrategy::Pin);
        let res = npm_engine("a", &["1.0.0", "1.2.0"])
            .lookup_updates(&config)
            .await
            .unwrap();

        let pin = &res.updates[0];
        assert_eq!(pin.update_type, UpdateType::Pin);
        assert!(pin.is_pin);
        assert_eq!(pin.new_value.as_deref(), Some("1.2.0"));
        assert_eq!(pin.new_major, Some(1));
        assert_eq!(res.current_version.as_deref(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_follow_tag() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        config.follow_tag = Some("next".to_string());
        let provider = FixtureDatasource::new("npm").with_package(
            "a",
            metadata(&["1.0.0", "1.1.0", "1.2.0"]).with_tag("next", "1.1.0"),
        );
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert!(res.warnings.is_empty());
        let versions: Vec<&str> = res
            .updates
            .iter()
            .filter_map(|u| u.new_version.as_deref())
            .collect();
        assert_eq!(versions, vec!["1.1.0"]);
    }

    #[tokio::test]
    async fn test_missing_follow_tag_warns() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        config.follow_tag = Some("next".to_string());
        let res = npm_engine("a", &["1.0.0", "1.1.0"])
            .lookup_updates(&config)
            .await
            .unwrap();
        assert!(res.updates.is_empty());
        assert_eq!(res.warnings[0].message, "Can't find version with tag next for a");
    }

    #[tokio::test]
    async fn test_rollback_without_candidate_warns() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        config.rollback_prs = true;
        let res = npm_engine("a", &["2.0.0"]).lookup_updates(&config).await.unwrap();
        assert!(res.updates.is_empty());
        assert_eq!(res.warnings[0].message, "Can't find version matching ^1.0.0 for a");
    }

    #[tokio::test]
    async fn test_vulnerability_alert_takes_lowest_fix() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        config.is_vulnerability_alert = true;
        let res = npm_engine("a", &["1.0.0", "1.0.1", "1.0.2", "2.0.0"])
            .lookup_updates(&config)
            .await
            .unwrap();
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].new_version.as_deref(), Some("1.0.1"));
    }

    #[tokio::test]
    async fn test_digest_update_for_unchanged_value() {
        let mut config = LookupConfig::new("node", "docker").with_current_value("20.1.0");
        config.current_digest = Some("sha256:old".to_string());
        config.update_pinned_dependencies = true;
        let provider = FixtureDatasource::new("docker")
            .with_versioning("loose")
            .with_package("node", metadata(&["20.1.0"]))
            .with_digest("node@20.1.0", "sha256:new");
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert_eq!(res.skip_reason, None);
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].update_type, UpdateType::Digest);
        assert_eq!(res.updates[0].resolved_digest(), Some("sha256:new"));
    }

    #[tokio::test]
    async fn test_follow_tag_never_downgrades_newer_current() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("1.2.0");
        config.update_pinned_dependencies = true;
        config.rollback_prs = true;
        config.follow_tag = Some("next".to_string());
        let provider = FixtureDatasource::new("npm").with_package(
            "a",
            metadata(&["1.0.0", "1.1.0", "1.2.0"]).with_tag("next", "1.1.0"),
        );
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert!(res.updates.is_empty());
        assert!(res.warnings.is_empty());
        assert_eq!(res.current_version.as_deref(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_follow_tag_moves_older_current_to_tag() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("1.0.0");
        config.update_pinned_dependencies = true;
        config.follow_tag = Some("next".to_string());
        let provider = FixtureDatasource::new("npm").with_package(
            "a",
            metadata(&["1.0.0", "1.1.0", "1.2.0"]).with_tag("next", "1.1.0"),
        );
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert_eq!(res.current_version.as_deref(), Some("1.0.0"));
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].new_version.as_deref(), Some("1.1.0"));
    }

    #[tokio::test]
    async fn test_vulnerability_alert_without_lock_bumps() {
        let mut config = LookupConfig::new("a", "npm")
            .with_current_value("^1.0.0")
            .with_range_strategy(RangeStrategy::UpdateLockfile);
        config.is_vulnerability_alert = true;
        let res = npm_engine("a", &["1.0.0", "1.0.1", "1.1.0"])
            .lookup_updates(&config)
            .await
            .unwrap();
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].new_value.as_deref(), Some("^1.0.1"));
        assert!(res.updates[0].is_bump);
    }

    fn docker(versions: &[&str]) -> FixtureDatasource {
        FixtureDatasource::new("docker")
            .with_versioning("loose")
            .with_package("node", metadata(versions))
    }

    #[tokio::test]
    async fn test_pin_digests_adds_pin_digest_update() {
        let mut config = LookupConfig::new("node", "docker").with_current_value("20.1.0");
        config.update_pinned_dependencies = true;
        config.pin_digests = true;
        let provider = docker(&["20.1.0"]).with_digest("node@20.1.0", "sha256:abc");
        let res = engine(provider).lookup_updates(&config).await.unwrap();

        assert_eq!(res.updates.len(), 1);
        let update = &res.updates[0];
        assert_eq!(update.update_type, UpdateType::PinDigest);
        assert!(update.is_pin_digest);
        assert_eq!(update.new_value.as_deref(), Some("20.1.0"));
        assert_eq!(update.resolved_digest(), Some("sha256:abc"));
    }

    #[tokio::test]
    async fn test_pin_update_suppresses_pin_digest() {
        let mut config = LookupConfig::new("a", "npm")
            .with_current_value("^1.0.0")
            .with_range_strategy(RangeStrategy::Pin);
        config.pin_digests = true;
        let provider = FixtureDatasource::new("npm")
            .with_package("a", metadata(&["1.0.0", "1.2.0"]))
            .with_digest("a@1.2.0", "sha256:pinned");
        let res = engine(provider).lookup_updates(&config).await.unwrap();

        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].update_type, UpdateType::Pin);
        assert_eq!(res.updates[0].resolved_digest(), Some("sha256:pinned"));
    }

    #[tokio::test]
    async fn test_digest_one_and_only_skips_digest_update() {
        let mut config = LookupConfig::new("node", "docker").with_current_value("20.1.0");
        config.update_pinned_dependencies = true;
        config.current_digest = Some("sha256:old".to_string());
        config.digest_one_and_only = true;
        let provider = docker(&["20.1.0", "20.2.0"])
            .with_digest("node@20.1.0", "sha256:same-tag")
            .with_digest("node@20.2.0", "sha256:next");
        let res = engine(provider).lookup_updates(&config).await.unwrap();

        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].update_type, UpdateType::Minor);
        assert_eq!(res.updates[0].resolved_digest(), Some("sha256:next"));
    }

    #[tokio::test]
    async fn test_unavailable_digest_drops_update() {
        let mut config = LookupConfig::new("node", "docker").with_current_value("20.1.0");
        config.update_pinned_dependencies = true;
        config.current_digest = Some("sha256:old".to_string());
        let provider = docker(&["20.1.0", "20.2.0"]).with_digest("node@20.1.0", "sha256:new");
        let res = engine(provider).lookup_updates(&config).await.unwrap();

        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].update_type, UpdateType::Digest);
        assert_eq!(res.updates[0].resolved_digest(), Some("sha256:new"));
    }

    #[tokio::test]
    async fn test_value_to_version_maps_versions() {
        let mut config = LookupConfig::new("node", "docker").with_current_value("v1.2.3");
        config.update_pinned_dependencies = true;
        let provider = docker(&["v1.2.3", "v1.3.0"]).with_digest_support();
        let res = engine(provider).lookup_updates(&config).await.unwrap();

        assert_eq!(res.current_version.as_deref(), Some("1.2.3"));
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].new_version.as_deref(), Some("1.3.0"));
        assert_eq!(res.updates[0].new_value.as_deref(), Some("v1.3.0"));
        assert!(res.updates[0].new_digest.is_none());
    }

    #[tokio::test]
    async fn test_tool_constraints_exclude_releases() {
        let mut config = LookupConfig::new("a", "npm").with_current_value("^1.0.0");
        config.extracted_constraints = Some(
            [("node".to_string(), "16.20.0".to_string())].into_iter().collect(),
        );
        let provider = FixtureDatasource::new("npm").with_package(
            "a",
            DependencyMetadata::from_releases(vec![
                Release::new("1.0.0"),
                Release::new("1.1.0").with_constraint("node", ">=14"),
                Release::new("1.2.0").with_constraint("node", ">=18"),
            ]),
        );
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert_eq!(res.updates.len(), 1);
        assert_eq!(res.updates[0].new_version.as_deref(), Some("1.1.0"));

        config.constraints = [("node".to_string(), "20.0.0".to_string())].into_iter().collect();
        let provider = FixtureDatasource::new("npm").with_package(
            "a",
            DependencyMetadata::from_releases(vec![
                Release::new("1.0.0"),
                Release::new("1.2.0").with_constraint("node", ">=18"),
            ]),
        );
        let res = engine(provider).lookup_updates(&config).await.unwrap();
        assert_eq!(res.updates[0].new_version.as_deref(), Some("1.2.0"));
    }
}
