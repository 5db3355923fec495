//! Loose versioning
//!
//! Dotted numeric versions with an optional `v` prefix and `-suffix`
//! (e.g., `1.2`, `v2.0.1`, `1.2.3.4`, `1.0-beta`). There are no ranges:
//! a value stands for exactly the version it names.

use super::{NewValueRequest, Versioning};
use std::cmp::Ordering;

pub struct LooseVersioning;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LooseVersion {
    release: Vec<u64>,
    suffix: Option<String>,
}

impl LooseVersion {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let input = input.strip_prefix('v').unwrap_or(input);
        let (core, suffix) = match input.split_once('-') {
            Some((core, suffix)) if !suffix.is_empty() => (core, Some(suffix.to_string())),
            Some(_) => return None,
            None => (input, None),
        };
        if core.is_empty() {
            return None;
        }

        let release: Option<Vec<u64>> = core
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<u64>().ok()
                }
            })
            .collect();

        Some(Self {
            release: release?,
            suffix,
        })
    }

    fn component(&self, idx: usize) -> u64 {
        self.release.get(idx).copied().unwrap_or(0)
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        for idx in 0..width {
            match self.component(idx).cmp(&other.component(idx)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        // A suffixed version sorts before its release
        match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl Versioning for LooseVersioning {
    fn id(&self) -> &'static str {
        "loose"
    }

    fn is_valid(&self, value: &str) -> bool {
        LooseVersion::parse(value).is_some()
    }

    fn is_version(&self, value: &str) -> bool {
        self.is_valid(value)
    }

    fn is_single_version(&self, value: &str) -> bool {
        self.is_valid(value)
    }

    fn is_stable(&self, version: &str) -> bool {
        LooseVersion::parse(version).is_some_and(|v| v.suffix.is_none())
    }

    fn matches(&self, version: &str, range: &str) -> bool {
        match (LooseVersion::parse(version), LooseVersion::parse(range)) {
            (Some(version), Some(range)) => version.cmp(&range) == Ordering::Equal,
            _ => false,
        }
    }

    fn is_compatible(&self, version: &str, _current_value: &str) -> bool {
        self.is_version(version)
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        LooseVersion::parse(a).cmp(&LooseVersion::parse(b))
    }

    fn get_new_value(&self, request: &NewValueRequest<'_>) -> Option<String> {
        LooseVersion::parse(request.new_version)?;
        let new_version = request.new_version.trim();
        if request.current_value.trim_start().starts_with('v') && !new_version.starts_with('v') {
            Some(format!("v{}", new_version))
        } else {
            Some(new_version.to_string())
        }
    }

    fn get_major(&self, version: &str) -> Option<u64> {
        LooseVersion::parse(version).map(|v| v.component(0))
    }

    fn get_minor(&self, version: &str) -> Option<u64> {
        LooseVersion::parse(version).map(|v| v.component(1))
    }

    fn get_patch(&self, version: &str) -> Option<u64> {
        LooseVersion::parse(version).map(|v| v.component(2))
    }

    fn value_to_version(&self, value: &str) -> Option<String> {
        let value = value.trim();
        LooseVersion::parse(value)?;
        Some(value.strip_prefix('v').unwrap_or(value).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RangeStrategy;

    #[test]
    fn test_parse_shapes() {
        assert!(LooseVersioning.is_version("1"));
        assert!(LooseVersioning.is_version("1.2.3.4"));
        assert!(LooseVersioning.is_version("v2.0"));
        assert!(LooseVersioning.is_version("1.0-beta"));
        assert!(!LooseVersioning.is_version("^1.0"));
        assert!(!LooseVersioning.is_version("1..2"));
        assert!(!LooseVersioning.is_version("1.0-"));
    }

    #[test]
    fn test_ordering_pads_missing_components() {
        assert_eq!(LooseVersioning.sort_versions("1.2", "1.2.0"), Ordering::Equal);
        assert!(LooseVersioning.is_greater_than("1.10", "1.9"));
        assert!(LooseVersioning.is_greater_than("1.0", "1.0-rc1"));
        assert!(LooseVersioning.is_greater_than("1.2.3.5", "1.2.3.4"));
    }

    #[test]
    fn test_matches_is_equality() {
        assert!(LooseVersioning.matches("1.2.0", "1.2"));
        assert!(LooseVersioning.matches("v1.2.0", "1.2.0"));
        assert!(!LooseVersioning.matches("1.2.1", "1.2"));
    }

    #[test]
    fn test_stability() {
        assert!(LooseVersioning.is_stable("1.2"));
        assert!(!LooseVersioning.is_stable("1.2-alpha"));
    }

    #[test]
    fn test_new_value_keeps_v_prefix() {
        let request = NewValueRequest {
            current_value: "v1.0.0",
            range_strategy: RangeStrategy::Replace,
            current_version: Some("v1.0.0"),
            new_version: "1.1.0",
        };
        assert_eq!(LooseVersioning.get_new_value(&request), Some("v1.1.0".to_string()));

        let request = NewValueRequest {
            current_value: "1.0.0",
            ..request
        };
        assert_eq!(LooseVersioning.get_new_value(&request), Some("1.1.0".to_string()));
    }

    #[test]
    fn test_value_to_version_strips_prefix() {
        assert_eq!(LooseVersioning.value_to_version("v1.2.3"), Some("1.2.3".to_string()));
        assert_eq!(LooseVersioning.value_to_version("1.2.3"), Some("1.2.3".to_string()));
        assert_eq!(LooseVersioning.value_to_version("not a version"), None);
    }

    #[test]
    fn test_no_range_floor() {
        assert_eq!(LooseVersioning.is_less_than_range("1.0", "2.0"), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(LooseVersioning.get_major("v3"), Some(3));
        assert_eq!(LooseVersioning.get_minor("v3"), Some(0));
        assert_eq!(LooseVersioning.get_patch("3.1.4.1"), Some(4));
    }
}
