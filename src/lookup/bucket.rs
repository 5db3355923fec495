//! Update bucket classification
//!
//! Candidates are grouped into buckets and each bucket produces at most one
//! update. With the default settings a dependency gets one `non-major` and
//! one `major` update.

use crate::domain::{LookupConfig, Release};
use crate::versioning::Versioning;

/// Bucket key for moving from `current_version` to `new_version`.
///
/// Returns None if the major of either version is unknown.
pub fn get_bucket(
    config: &LookupConfig,
    current_version: &str,
    new_version: &str,
    versioning: &dyn Versioning,
) -> Option<String> {
    if let Some(group) = &config.group_name {
        return Some(group.clone());
    }
    if !config.separate_major_minor {
        return Some("latest".to_string());
    }

    let from_major = versioning.get_major(current_version)?;
    let to_major = versioning.get_major(new_version)?;
    if from_major != to_major {
        if config.separate_multiple_major {
            return Some(format!("major-{}", to_major));
        }
        return Some("major".to_string());
    }

    if config.separate_minor_patch {
        if versioning.get_minor(current_version) == versioning.get_minor(new_version) {
            return Some("patch".to_string());
        }
        return Some("minor".to_string());
    }
    Some("non-major".to_string())
}

/// Group `releases` by bucket, keeping buckets in order of first appearance
pub fn assign_buckets(
    config: &LookupConfig,
    current_version: &str,
    releases: Vec<Release>,
    versioning: &dyn Versioning,
) -> Vec<(String, Vec<Release>)> {
    let mut buckets: Vec<(String, Vec<Release>)> = Vec::new();
    for release in releases {
        let Some(key) = get_bucket(config, current_version, &release.version, versioning) else {
            continue;
        };
        match buckets.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(release),
            None => buckets.push((key, vec![release])),
        }
    }
    buckets
}
