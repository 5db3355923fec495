//! semver versioning
//!
//! Same grammar as npm, but only versions on the current constraint's
//! compatible line are candidates:
//! - `1.x.y` and above: same major
//! - `0.x.y`: same minor
//! - `0.0.x`: same patch

use super::npm::{render_new_value, NpmVersioning};
use super::range::{parse_version, Range};
use super::{NewValueRequest, Versioning};
use semver::Version;
use std::cmp::Ordering;

pub struct SemverVersioning;

fn same_line(base: &Version, candidate: &Version) -> bool {
    if base.major > 0 {
        candidate.major == base.major
    } else if base.minor > 0 {
        candidate.major == 0 && candidate.minor == base.minor
    } else {
        candidate.major == 0 && candidate.minor == 0 && candidate.patch == base.patch
    }
}

impl Versioning for SemverVersioning {
    fn id(&self) -> &'static str {
        "semver"
    }

    fn is_valid(&self, value: &str) -> bool {
        NpmVersioning.is_valid(value)
    }

    fn is_version(&self, value: &str) -> bool {
        NpmVersioning.is_version(value)
    }

    fn is_single_version(&self, value: &str) -> bool {
        NpmVersioning.is_single_version(value)
    }

    fn is_stable(&self, version: &str) -> bool {
        NpmVersioning.is_stable(version)
    }

    fn matches(&self, version: &str, range: &str) -> bool {
        NpmVersioning.matches(version, range)
    }

    fn is_compatible(&self, version: &str, current_value: &str) -> bool {
        let Some(candidate) = parse_version(version) else {
            return false;
        };
        let base = parse_version(current_value)
            .or_else(|| Range::parse(current_value).and_then(|range| range.floor()));
        match base {
            Some(base) => same_line(&base, &candidate),
            // `*` and ceiling-only ranges have no line to stay on
            None => true,
        }
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        NpmVersioning.sort_versions(a, b)
    }

    fn get_new_value(&self, request: &NewValueRequest<'_>) -> Option<String> {
        render_new_value(request)
    }

    fn get_major(&self, version: &str) -> Option<u64> {
        NpmVersioning.get_major(version)
    }

    fn get_minor(&self, version: &str) -> Option<u64> {
        NpmVersioning.get_minor(version)
    }

    fn get_patch(&self, version: &str) -> Option<u64> {
        NpmVersioning.get_patch(version)
    }

    fn is_less_than_range(&self, version: &str, range: &str) -> Option<bool> {
        NpmVersioning.is_less_than_range(version, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatible_same_major() {
        assert!(SemverVersioning.is_compatible("1.2.0", "^1.0.0"));
        assert!(!SemverVersioning.is_compatible("2.0.0", "^1.0.0"));
        assert!(SemverVersioning.is_compatible("1.9.0", "1.0.0"));
    }

    #[test]
    fn test_compatible_zero_major() {
        assert!(SemverVersioning.is_compatible("0.3.9", "^0.3.1"));
        assert!(!SemverVersioning.is_compatible("0.4.0", "^0.3.1"));
        assert!(SemverVersioning.is_compatible("0.0.4", "0.0.4"));
        assert!(!SemverVersioning.is_compatible("0.0.5", "0.0.4"));
    }

    #[test]
    fn test_compatible_without_floor() {
        assert!(SemverVersioning.is_compatible("9.0.0", "*"));
        assert!(SemverVersioning.is_compatible("9.0.0", "<2.0.0"));
        assert!(!SemverVersioning.is_compatible("not-a-version", "*"));
    }

    #[test]
    fn test_delegates_grammar() {
        assert!(SemverVersioning.matches("1.4.0", "~1.4.0"));
        assert_eq!(SemverVersioning.id(), "semver");
        assert_eq!(
            SemverVersioning.get_new_value(&NewValueRequest {
                current_value: "^1.0.0",
                range_strategy: crate::domain::RangeStrategy::Bump,
                current_version: Some("1.0.0"),
                new_version: "1.2.0",
            }),
            Some("^1.2.0".to_string())
        );
    }
}
