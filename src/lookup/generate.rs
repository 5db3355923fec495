//! Update generation

use crate::domain::{LookupConfig, NewDigest, RangeStrategy, Release, Update, UpdateType};
use crate::versioning::{NewValueRequest, Versioning};
use tracing::warn;

/// Semantic distance between two versions
pub(crate) fn update_type(versioning: &dyn Versioning, from: &str, to: &str) -> UpdateType {
    if versioning.get_major(to) > versioning.get_major(from) {
        UpdateType::Major
    } else if versioning.get_minor(to) > versioning.get_minor(from) {
        UpdateType::Minor
    } else {
        UpdateType::Patch
    }
}

/// Build the update moving from `baseline_version` to `release`
pub fn generate_update(
    config: &LookupConfig,
    versioning: &dyn Versioning,
    range_strategy: RangeStrategy,
    baseline_version: &str,
    bucket: &str,
    release: &Release,
) -> Update {
    let new_version = release.version.as_str();
    let current_value = config.current_value.as_deref();

    let new_value = current_value.map(|current_value| {
        let request = NewValueRequest {
            current_value,
            range_strategy,
            current_version: Some(baseline_version),
            new_version,
        };
        versioning.get_new_value(&request).unwrap_or_else(|| {
            warn!(
                dependency = %config.dep_name,
                current_value,
                new_version,
                %range_strategy,
                "could not render a new value, keeping the current one"
            );
            current_value.to_string()
        })
    });

    let mut update = Update::new(update_type(versioning, baseline_version, new_version));
    update.bucket = Some(bucket.to_string());
    update.new_version = Some(new_version.to_string());
    update.new_major = versioning.get_major(new_version);
    update.new_minor = versioning.get_minor(new_version);
    update.is_range = new_value
        .as_deref()
        .is_some_and(|value| !versioning.is_version(value));
    update.is_lockfile_update =
        range_strategy == RangeStrategy::UpdateLockfile && new_value.as_deref() == current_value;
    update.is_bump = range_strategy == RangeStrategy::Bump
        && current_value.is_some_and(|value| versioning.matches(new_version, value));
    update.release_timestamp = release.release_timestamp;
    update.registry_url = release.registry_url.clone();
    update.new_digest = release.new_digest.clone().map(NewDigest::Resolved);
    update.with_new_value(new_value)
}
