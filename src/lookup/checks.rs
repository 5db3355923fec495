//! Release gating checks
//!
//! A gate picks the release a bucket proposes. The default gate holds back
//! releases younger than `minimumReleaseAge`, which package rules can set per
//! update type.

use super::generate::update_type;
use crate::domain::{apply_package_rules, ChecksFilter, LookupConfig, Release};
use crate::error::LookupError;
use crate::settings::parse_duration;
use crate::versioning::Versioning;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::trace;

/// Config of a lookup together with its resolved current version
#[derive(Debug, Clone, Copy)]
pub struct ResultConfig<'a> {
    pub config: &'a LookupConfig,
    pub current_version: &'a str,
}

/// Decision of a gate for one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateOutcome {
    /// Release to propose; None stops the lookup
    pub release: Option<Release>,
    pub pending_checks: bool,
    /// Newer releases held back, ascending
    pub pending_releases: Vec<Release>,
}

/// Chooses the release a bucket proposes
#[async_trait]
pub trait ReleaseGate: Send + Sync {
    /// `sorted_releases` is ascending and non-empty
    async fn admit(
        &self,
        config: &ResultConfig<'_>,
        versioning: &dyn Versioning,
        bucket: &str,
        sorted_releases: &[Release],
    ) -> Result<GateOutcome, LookupError>;
}

/// Default gate based on release age
#[derive(Debug, Clone, Default)]
pub struct InternalChecks {
    now: Option<DateTime<Utc>>,
}

impl InternalChecks {
    /// Gate that reads the clock on every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate with a fixed clock (for testing)
    pub fn with_time(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn is_pending(
        &self,
        release: &Release,
        minimum_release_age: Option<&str>,
    ) -> Result<bool, LookupError> {
        let (Some(age), Some(released_at)) = (minimum_release_age, release.release_timestamp)
        else {
            return Ok(false);
        };
        let age = parse_duration(age).map_err(|e| LookupError::config_validation(e.to_string()))?;
        let age = chrono::Duration::from_std(age)
            .map_err(|e| LookupError::config_validation(e.to_string()))?;
        Ok(self.now() - released_at < age)
    }
}

#[async_trait]
impl ReleaseGate for InternalChecks {
    async fn admit(
        &self,
        config: &ResultConfig<'_>,
        versioning: &dyn Versioning,
        bucket: &str,
        sorted_releases: &[Release],
    ) -> Result<GateOutcome, LookupError> {
        let filter = config.config.internal_checks_filter;
        if filter == ChecksFilter::None {
            return Ok(GateOutcome {
                release: sorted_releases.last().cloned(),
                ..GateOutcome::default()
            });
        }

        let mut release = None;
        let mut pending_releases = Vec::new();
        for candidate in sorted_releases.iter().rev() {
            let kind = update_type(versioning, config.current_version, &candidate.version);
            let rule_config = apply_package_rules(config.config, Some(kind))?;
            if self.is_pending(candidate, rule_config.minimum_release_age.as_deref())? {
                trace!(bucket, version = %candidate.version, "release is pending");
                pending_releases.insert(0, candidate.clone());
                continue;
            }
            release = Some(candidate.clone());
            break;
        }

        let mut pending_checks = false;
        if release.is_none() && !pending_releases.is_empty() {
            trace!(bucket, "all releases are pending, using the newest");
            release = pending_releases.pop();
            pending_releases.clear();
            pending_checks = filter == ChecksFilter::Strict;
        }

        Ok(GateOutcome {
            release,
            pending_checks,
            pending_releases,
        })
    }
}
