//! Release filtering
//!
//! Narrows the fetched releases down to the ones a dependency may move to.
//! Filters are applied in this order:
//! 1. Newer than the current version
//! 2. `ignoreDeprecated`
//! 3. `allowedVersions`
//! 4. `ignoreVersions`
//! 5. `respectLatest`
//! 6. `ignoreUnstable`

use crate::domain::{LookupConfig, Release};
use crate::error::LookupError;
use crate::versioning::Versioning;
use regex::{Regex, RegexBuilder};

/// Parse a `/pattern/` or `/pattern/i` version regex.
///
/// Returns `Ok(None)` if `value` is not written as a regex.
pub fn parse_version_regex(value: &str) -> Result<Option<Regex>, LookupError> {
    let Some(body) = value.strip_prefix('/') else {
        return Ok(None);
    };
    let (pattern, case_insensitive) = if let Some(pattern) = body.strip_suffix("/i") {
        (pattern, true)
    } else if let Some(pattern) = body.strip_suffix('/') {
        (pattern, false)
    } else {
        return Ok(None);
    };

    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map(Some)
        .map_err(|e| {
            LookupError::config_validation(format!("invalid version regex '{}': {}", value, e))
        })
}

fn is_ignored(
    version: &str,
    ignore_versions: &[String],
    versioning: &dyn Versioning,
) -> Result<bool, LookupError> {
    for ignored in ignore_versions {
        if ignored == version {
            return Ok(true);
        }
        if let Some(re) = parse_version_regex(ignored)? {
            if re.is_match(version) {
                return Ok(true);
            }
        } else if versioning.is_valid(ignored) && versioning.matches(version, ignored) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Filter `releases` down to update candidates for `current_version`
pub fn filter_versions(
    config: &LookupConfig,
    current_version: &str,
    latest_tag: Option<&str>,
    releases: &[Release],
    versioning: &dyn Versioning,
) -> Result<Vec<Release>, LookupError> {
    let mut filtered: Vec<Release> = releases
        .iter()
        .filter(|r| versioning.is_version(&r.version))
        .filter(|r| versioning.is_greater_than(&r.version, current_version))
        .cloned()
        .collect();

    if config.ignore_deprecated {
        let current_is_deprecated = releases
            .iter()
            .any(|r| r.version == current_version && r.is_deprecated);
        if !current_is_deprecated {
            filtered.retain(|r| !r.is_deprecated);
        }
    }

    if let Some(allowed) = config.allowed_versions.as_deref() {
        if let Some(re) = parse_version_regex(allowed)? {
            filtered.retain(|r| re.is_match(&r.version));
        } else if versioning.is_valid(allowed) {
            filtered.retain(|r| versioning.matches(&r.version, allowed));
        } else {
            return Err(LookupError::config_validation(format!(
                "invalid allowedVersions '{}' for versioning {}",
                allowed,
                versioning.id()
            )));
        }
    }

    if !config.ignore_versions.is_empty() {
        let mut kept = Vec::with_capacity(filtered.len());
        for release in filtered {
            if !is_ignored(&release.version, &config.ignore_versions, versioning)? {
                kept.push(release);
            }
        }
        filtered = kept;
    }

    if config.respect_latest {
        if let Some(latest) = latest_tag {
            if !versioning.is_greater_than(current_version, latest) {
                filtered.retain(|r| !versioning.is_greater_than(&r.version, latest));
            }
        }
    }

    if config.ignore_unstable {
        let current_is_stable = versioning.is_stable(current_version);
        let current_major = versioning.get_major(current_version);
        filtered.retain(|r| {
            versioning.is_stable(&r.version)
                || (!current_is_stable
                    && current_major.is_some()
                    && versioning.get_major(&r.version) == current_major)
        });
    }

    Ok(filtered)
}
