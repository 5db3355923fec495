//! npm versioning
//!
//! Versions are semver versions, constraints use the npm range grammar in
//! [`super::range`]. Every newer version is a candidate, majors included.

use super::range::{parse_version, Range};
use super::{NewValueRequest, Versioning};
use crate::domain::RangeStrategy;
use std::cmp::Ordering;

pub struct NpmVersioning;

/// Renders a new npm constraint; shared by the range-based schemes
pub(super) fn render_new_value(request: &NewValueRequest<'_>) -> Option<String> {
    let new_version = parse_version(request.new_version)?;
    if request.range_strategy == RangeStrategy::Pin {
        return Some(new_version.to_string());
    }

    let current = request.current_value.trim();
    if parse_version(current).is_some() {
        let prefix = if current.starts_with('=') {
            "="
        } else if current.starts_with('v') {
            "v"
        } else {
            ""
        };
        return Some(format!("{}{}", prefix, new_version));
    }

    let range = Range::parse(current)?;
    let satisfied = range.satisfies(&new_version);
    let value = match request.range_strategy {
        RangeStrategy::Bump => range.bump(&new_version),
        RangeStrategy::Widen if !satisfied && !range.has_ceiling() => {
            format!("{} || {}", current, range.replace(&new_version))
        }
        _ if satisfied => current.to_string(),
        _ => range.replace(&new_version),
    };
    Some(value)
}

impl Versioning for NpmVersioning {
    fn id(&self) -> &'static str {
        "npm"
    }

    fn is_valid(&self, value: &str) -> bool {
        Range::parse(value).is_some()
    }

    fn is_version(&self, value: &str) -> bool {
        parse_version(value).is_some()
    }

    fn is_single_version(&self, value: &str) -> bool {
        self.is_version(value)
    }

    fn is_stable(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| v.pre.is_empty())
    }

    fn matches(&self, version: &str, range: &str) -> bool {
        match (parse_version(version), Range::parse(range)) {
            (Some(version), Some(range)) => range.satisfies(&version),
            _ => false,
        }
    }

    fn is_compatible(&self, version: &str, _current_value: &str) -> bool {
        self.is_version(version)
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        parse_version(a).cmp(&parse_version(b))
    }

    fn get_new_value(&self, request: &NewValueRequest<'_>) -> Option<String> {
        render_new_value(request)
    }

    fn get_major(&self, version: &str) -> Option<u64> {
        parse_version(version).map(|v| v.major)
    }

    fn get_minor(&self, version: &str) -> Option<u64> {
        parse_version(version).map(|v| v.minor)
    }

    fn get_patch(&self, version: &str) -> Option<u64> {
        parse_version(version).map(|v| v.patch)
    }

    fn is_less_than_range(&self, version: &str, range: &str) -> Option<bool> {
        let below = match (parse_version(version), Range::parse(range)) {
            (Some(version), Some(range)) => range.is_above(&version),
            _ => false,
        };
        Some(below)
    }
}
