//! Package rules
//!
//! A package rule narrows down which dependencies it applies to with a set of
//! matchers and carries policy overrides for them. Rules are applied in order,
//! so later rules win over earlier ones.

use super::{ChecksFilter, LookupConfig, RangeStrategy, UpdateType};
use crate::error::LookupError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Policy fields a rule (or the settings `[defaults]` table) can override
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_strategy: Option<RangeStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_prs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_digests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_one_and_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_pinned_dependencies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_unstable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_latest: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_versions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_major_minor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_multiple_major: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_minor_patch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_release_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_checks_filter: Option<ChecksFilter>,
}

impl RuleOverrides {
    /// Writes every set field into `config`
    pub fn apply_to(&self, config: &mut LookupConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        if let Some(versioning) = &self.versioning {
            config.versioning = Some(versioning.clone());
        }
        if let Some(tag) = &self.follow_tag {
            config.follow_tag = Some(tag.clone());
        }
        if let Some(allowed) = &self.allowed_versions {
            config.allowed_versions = Some(allowed.clone());
        }
        if let Some(group) = &self.group_name {
            config.group_name = Some(group.clone());
        }
        if let Some(age) = &self.minimum_release_age {
            config.minimum_release_age = Some(age.clone());
        }
        set(&mut config.range_strategy, &self.range_strategy);
        set(&mut config.rollback_prs, &self.rollback_prs);
        set(&mut config.pin_digests, &self.pin_digests);
        set(&mut config.digest_one_and_only, &self.digest_one_and_only);
        set(
            &mut config.update_pinned_dependencies,
            &self.update_pinned_dependencies,
        );
        set(&mut config.ignore_unstable, &self.ignore_unstable);
        set(&mut config.ignore_deprecated, &self.ignore_deprecated);
        set(&mut config.respect_latest, &self.respect_latest);
        set(&mut config.ignore_versions, &self.ignore_versions);
        set(&mut config.separate_major_minor, &self.separate_major_minor);
        set(
            &mut config.separate_multiple_major,
            &self.separate_multiple_major,
        );
        set(&mut config.separate_minor_patch, &self.separate_minor_patch);
        set(
            &mut config.internal_checks_filter,
            &self.internal_checks_filter,
        );
    }
}

/// A set of matchers plus the overrides applied when all of them match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_package_names: Vec<String>,
    /// Regular expressions matched against the dependency name
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_package_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_datasources: Vec<String>,
    /// Prefixes matched against the source url
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_source_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_update_types: Vec<UpdateType>,
    #[serde(flatten)]
    pub overrides: RuleOverrides,
}

impl PackageRule {
    /// Returns true if every non-empty matcher matches
    pub fn matches(
        &self,
        config: &LookupConfig,
        update_type: Option<UpdateType>,
    ) -> Result<bool, LookupError> {
        if !self.match_package_names.is_empty()
            && !self.match_package_names.contains(&config.dep_name)
        {
            return Ok(false);
        }

        if !self.match_package_patterns.is_empty() {
            let mut matched = false;
            for pattern in &self.match_package_patterns {
                let re = Regex::new(pattern).map_err(|e| {
                    LookupError::config_validation(format!(
                        "invalid matchPackagePatterns regex '{}': {}",
                        pattern, e
                    ))
                })?;
                if re.is_match(&config.dep_name) {
                    matched = true;
                    break;
                }
            }
            if !matched {
                return Ok(false);
            }
        }

        if !self.match_datasources.is_empty() && !self.match_datasources.contains(&config.datasource)
        {
            return Ok(false);
        }

        if !self.match_source_urls.is_empty() {
            let Some(source_url) = config.source_url.as_deref() else {
                return Ok(false);
            };
            if !self
                .match_source_urls
                .iter()
                .any(|prefix| source_url.starts_with(prefix.as_str()))
            {
                return Ok(false);
            }
        }

        if !self.match_update_types.is_empty() {
            match update_type {
                Some(update_type) if self.match_update_types.contains(&update_type) => {}
                _ => return Ok(false),
            }
        }

        Ok(true)
    }
}

/// Returns a new config with every matching rule's overrides applied in order
pub fn apply_package_rules(
    config: &LookupConfig,
    update_type: Option<UpdateType>,
) -> Result<LookupConfig, LookupError> {
    let mut derived = config.clone();
    for rule in &config.package_rules {
        // Matching runs against the original config so one rule's overrides
        // cannot enable a later rule.
        if rule.matches(config, update_type)? {
            rule.overrides.apply_to(&mut derived);
        }
    }
    Ok(derived)
}
