//! Rollback of constraints nothing satisfies anymore

use crate::domain::{LookupConfig, RangeStrategy, Release, Update, UpdateType};
use crate::versioning::{NewValueRequest, Versioning};
use tracing::debug;

/// Downgrade to the newest stable release below the current constraint.
///
/// Returns None if the scheme has no notion of a range floor or no release
/// qualifies.
pub fn get_rollback_update(
    config: &LookupConfig,
    releases: &[Release],
    versioning: &dyn Versioning,
) -> Option<Update> {
    let current_value = config.current_value.as_deref()?;

    let mut candidates = Vec::new();
    for release in releases {
        let below = versioning.is_less_than_range(&release.version, current_value)?;
        if below && versioning.is_stable(&release.version) {
            candidates.push(release.version.as_str());
        }
    }
    let new_version = candidates
        .into_iter()
        .max_by(|a, b| versioning.sort_versions(a, b))?;
    debug!(dependency = %config.dep_name, current_value, new_version, "rolling back");

    let rendered = versioning.get_new_value(&NewValueRequest {
        current_value,
        range_strategy: RangeStrategy::Replace,
        current_version: None,
        new_version,
    });
    let new_value = match rendered {
        Some(value) if versioning.matches(new_version, &value) => value,
        _ => new_version.to_string(),
    };

    let mut update = Update::new(UpdateType::Rollback).with_new_value(Some(new_value));
    update.bucket = Some("rollback".to_string());
    update.new_version = Some(new_version.to_string());
    update.new_major = versioning.get_major(new_version);
    Some(update)
}
