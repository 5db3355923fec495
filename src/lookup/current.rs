//! Current version resolution
//!
//! Works out which concrete version a constraint currently stands for.

use crate::domain::{RangeStrategy, Release};
use crate::versioning::Versioning;

/// Resolve the current version of `current_value` from `candidates`.
///
/// The result is always one of `candidates`, or the lock under
/// `update-lockfile` and `pin`.
pub fn resolve_current_version(
    current_value: Option<&str>,
    locked_version: Option<&str>,
    versioning: &dyn Versioning,
    range_strategy: RangeStrategy,
    latest_tag: Option<&str>,
    candidates: &[String],
) -> Option<String> {
    if range_strategy == RangeStrategy::UpdateLockfile {
        if let Some(locked) = locked_version {
            return Some(locked.to_string());
        }
    }
    let current_value = current_value?;

    let mut satisfying: Vec<String> = candidates
        .iter()
        .filter(|v| versioning.matches(v, current_value))
        .cloned()
        .collect();

    // Nothing newer than `latest` counts when `latest` itself is in range
    if let Some(latest) = latest_tag {
        if versioning.matches(latest, current_value) {
            satisfying.retain(|v| !versioning.is_greater_than(v, latest));
        }
    }

    if range_strategy == RangeStrategy::Pin {
        locked_version
            .map(str::to_string)
            .or_else(|| versioning.get_satisfying_version(&satisfying, current_value))
    } else {
        versioning.min_satisfying_version(&satisfying, current_value)
    }
}

/// Last resort when no candidate matches: an exact value stands for itself
pub fn current_value_as_version(
    current_value: Option<&str>,
    versioning: &dyn Versioning,
) -> Option<String> {
    current_value
        .filter(|value| versioning.is_version(value))
        .map(str::to_string)
}

/// Resolve against non-deprecated releases first, then against all of them
pub fn resolve_with_fallback(
    current_value: Option<&str>,
    locked_version: Option<&str>,
    versioning: &dyn Versioning,
    range_strategy: RangeStrategy,
    latest_tag: Option<&str>,
    non_deprecated: &[Release],
    all: &[Release],
) -> Option<String> {
    let versions = |releases: &[Release]| -> Vec<String> {
        releases.iter().map(|r| r.version.clone()).collect()
    };
    let resolve = |pool: Vec<String>| {
        resolve_current_version(
            current_value,
            locked_version,
            versioning,
            range_strategy,
            latest_tag,
            &pool,
        )
    };

    resolve(versions(non_deprecated)).or_else(|| resolve(versions(all)))
}
