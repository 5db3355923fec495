//! Lookup configuration for a single dependency
//!
//! A LookupConfig is treated as immutable. The only sanctioned changes are
//! pure re-derivations that return a new value:
//! - [`LookupConfig::merge_constraints`]
//! - [`crate::domain::apply_package_rules`]

use super::PackageRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Policy for rewriting an existing constraint when updating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeStrategy {
    /// Let the range-strategy resolver decide
    #[default]
    Auto,
    /// Replace ranges with exact versions
    Pin,
    /// Raise the range floor to the new version
    Bump,
    /// Replace the range only when the new version falls outside it
    Replace,
    /// Extend the range to also allow the new version
    Widen,
    /// Keep the manifest value, update only the lock file
    UpdateLockfile,
    /// Like update-lockfile, and drop anything that would change the value
    InRangeOnly,
}

impl fmt::Display for RangeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeStrategy::Auto => "auto",
            RangeStrategy::Pin => "pin",
            RangeStrategy::Bump => "bump",
            RangeStrategy::Replace => "replace",
            RangeStrategy::Widen => "widen",
            RangeStrategy::UpdateLockfile => "update-lockfile",
            RangeStrategy::InRangeOnly => "in-range-only",
        };
        write!(f, "{}", name)
    }
}

/// How strictly the gating checks hold back young releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksFilter {
    /// Take the newest release even when every candidate is pending, but flag it
    #[default]
    Strict,
    /// Take the newest release when every candidate is pending, without flagging
    Flexible,
    /// No gating at all
    None,
}

/// Input of a dependency lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LookupConfig {
    /// Dependency name as it appears in the manifest
    pub dep_name: String,
    /// Registry name, when it differs from `dep_name`
    pub package_name: Option<String>,
    /// Datasource id (e.g., "npm")
    pub datasource: String,
    /// Constraint currently declared in the manifest
    pub current_value: Option<String>,
    pub current_digest: Option<String>,
    /// Version currently resolved in the lock file
    pub locked_version: Option<String>,
    /// Versioning scheme id; the datasource default is used when unset
    pub versioning: Option<String>,
    pub range_strategy: RangeStrategy,
    /// Only propose the version this distribution tag points at
    pub follow_tag: Option<String>,
    pub rollback_prs: bool,
    pub pin_digests: bool,
    /// Skip the digest update when a version update exists
    pub digest_one_and_only: bool,
    pub is_vulnerability_alert: bool,
    pub update_pinned_dependencies: bool,

    pub ignore_unstable: bool,
    pub ignore_deprecated: bool,
    /// Never propose versions newer than the `latest` tag
    pub respect_latest: bool,
    /// Regex (`/.../`) or range that candidates must satisfy
    pub allowed_versions: Option<String>,
    /// Exact versions, regexes (`/.../`) or ranges to never propose
    pub ignore_versions: Vec<String>,

    pub separate_major_minor: bool,
    pub separate_multiple_major: bool,
    pub separate_minor_patch: bool,
    /// Put every candidate into one bucket with this name
    pub group_name: Option<String>,

    /// Minimum age before a release is admitted (e.g., "3d")
    pub minimum_release_age: Option<String>,
    pub internal_checks_filter: ChecksFilter,

    /// Tool versions in use; releases requiring other ones are dropped (e.g., node -> "18.0.0")
    pub constraints: BTreeMap<String, String>,
    /// Constraints found in the package file, merged under `constraints`
    pub extracted_constraints: Option<BTreeMap<String, String>>,
    /// Source repository, known once releases are fetched
    pub source_url: Option<String>,
    pub package_rules: Vec<PackageRule>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            dep_name: String::new(),
            package_name: None,
            datasource: String::new(),
            current_value: None,
            current_digest: None,
            locked_version: None,
            versioning: None,
            range_strategy: RangeStrategy::Auto,
            follow_tag: None,
            rollback_prs: false,
            pin_digests: false,
            digest_one_and_only: false,
            is_vulnerability_alert: false,
            update_pinned_dependencies: false,
            ignore_unstable: true,
            ignore_deprecated: false,
            respect_latest: true,
            allowed_versions: None,
            ignore_versions: Vec::new(),
            separate_major_minor: true,
            separate_multiple_major: false,
            separate_minor_patch: false,
            group_name: None,
            minimum_release_age: None,
            internal_checks_filter: ChecksFilter::Strict,
            constraints: BTreeMap::new(),
            extracted_constraints: None,
            source_url: None,
            package_rules: Vec::new(),
        }
    }
}

impl LookupConfig {
    /// Creates a new config for a dependency
    pub fn new(dep_name: impl Into<String>, datasource: impl Into<String>) -> Self {
        Self {
            dep_name: dep_name.into(),
            datasource: datasource.into(),
            ..Self::default()
        }
    }

    /// Sets the current value (builder pattern)
    pub fn with_current_value(mut self, value: impl Into<String>) -> Self {
        self.current_value = Some(value.into());
        self
    }

    /// Sets the locked version (builder pattern)
    pub fn with_locked_version(mut self, version: impl Into<String>) -> Self {
        self.locked_version = Some(version.into());
        self
    }

    /// Sets the versioning scheme (builder pattern)
    pub fn with_versioning(mut self, versioning: impl Into<String>) -> Self {
        self.versioning = Some(versioning.into());
        self
    }

    /// Sets the range strategy (builder pattern)
    pub fn with_range_strategy(mut self, strategy: RangeStrategy) -> Self {
        self.range_strategy = strategy;
        self
    }

    /// Name used to query the registry
    pub fn lookup_name(&self) -> &str {
        self.package_name.as_deref().unwrap_or(&self.dep_name)
    }

    /// A lock exists but the manifest declares no constraint
    pub fn is_unconstrained(&self) -> bool {
        self.locked_version.is_some() && self.current_value.is_none()
    }

    /// Returns a config with extracted constraints merged under explicit ones
    pub fn merge_constraints(&self) -> Self {
        let mut merged = self.clone();
        if let Some(extracted) = merged.extracted_constraints.take() {
            let mut constraints = extracted;
            constraints.extend(self.constraints.clone());
            merged.constraints = constraints;
        }
        merged
    }

    /// Returns a config that records the source url found in the registry
    pub fn with_source_url(&self, source_url: Option<String>) -> Self {
        Self {
            source_url,
            ..self.clone()
        }
    }
}
