//! Versioning schemes
//!
//! A versioning scheme knows how to read versions and constraints of one
//! ecosystem, and how to render a new constraint for a new version:
//! - `npm`: npm ranges; every newer version is a candidate
//! - `semver`: npm ranges, restricted to the semver-compatible line
//! - `loose`: dotted numeric versions without ranges
//!
//! The lookup engine only talks to the [`Versioning`] trait. Scheme ids are
//! resolved once with [`get`].

mod loose;
mod npm;
pub mod range;
mod semver;

pub use loose::LooseVersioning;
pub use npm::NpmVersioning;
pub use self::semver::SemverVersioning;

use crate::domain::RangeStrategy;
use std::cmp::Ordering;

/// Input for rendering a new constraint
#[derive(Debug, Clone, Copy)]
pub struct NewValueRequest<'a> {
    pub current_value: &'a str,
    pub range_strategy: RangeStrategy,
    pub current_version: Option<&'a str>,
    pub new_version: &'a str,
}

/// Version and constraint semantics of one ecosystem
pub trait Versioning: Send + Sync {
    /// Scheme id (e.g., "npm")
    fn id(&self) -> &'static str;

    /// Returns true if `value` is a valid version or constraint
    fn is_valid(&self, value: &str) -> bool;

    /// Returns true if `value` is a plain version
    fn is_version(&self, value: &str) -> bool;

    /// Returns true if `value` admits exactly one version
    fn is_single_version(&self, value: &str) -> bool;

    fn is_stable(&self, version: &str) -> bool;

    fn is_greater_than(&self, version: &str, other: &str) -> bool {
        self.sort_versions(version, other) == Ordering::Greater
    }

    /// Returns true if `version` satisfies the constraint `range`
    fn matches(&self, version: &str, range: &str) -> bool;

    /// Returns true if `version` may replace the current constraint at all
    fn is_compatible(&self, version: &str, current_value: &str) -> bool;

    fn sort_versions(&self, a: &str, b: &str) -> Ordering;

    /// Renders the constraint that should replace `current_value`
    fn get_new_value(&self, request: &NewValueRequest<'_>) -> Option<String>;

    fn get_major(&self, version: &str) -> Option<u64>;
    fn get_minor(&self, version: &str) -> Option<u64>;
    fn get_patch(&self, version: &str) -> Option<u64>;

    /// Highest of `versions` satisfying `range`
    fn get_satisfying_version(&self, versions: &[String], range: &str) -> Option<String> {
        versions
            .iter()
            .filter(|v| self.matches(v, range))
            .max_by(|a, b| self.sort_versions(a, b))
            .cloned()
    }

    /// Lowest of `versions` satisfying `range`
    fn min_satisfying_version(&self, versions: &[String], range: &str) -> Option<String> {
        versions
            .iter()
            .filter(|v| self.matches(v, range))
            .min_by(|a, b| self.sort_versions(a, b))
            .cloned()
    }

    /// Whether `version` sits below everything `range` admits.
    /// None if the scheme has no notion of a range floor.
    fn is_less_than_range(&self, _version: &str, _range: &str) -> Option<bool> {
        None
    }

    /// Maps a manifest value to the version it stands for.
    /// None if the scheme uses values as versions unchanged.
    fn value_to_version(&self, _value: &str) -> Option<String> {
        None
    }
}

/// The closed set of supported schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningScheme {
    Npm,
    Semver,
    Loose,
}

impl VersioningScheme {
    /// All supported scheme ids
    pub const IDS: [&'static str; 3] = ["npm", "semver", "loose"];

    fn inner(&self) -> &'static dyn Versioning {
        match self {
            VersioningScheme::Npm => &NpmVersioning,
            VersioningScheme::Semver => &SemverVersioning,
            VersioningScheme::Loose => &LooseVersioning,
        }
    }
}

/// Resolves a scheme id
pub fn get(id: &str) -> Option<VersioningScheme> {
    match id {
        "npm" => Some(VersioningScheme::Npm),
        "semver" => Some(VersioningScheme::Semver),
        "loose" => Some(VersioningScheme::Loose),
        _ => None,
    }
}

impl Versioning for VersioningScheme {
    fn id(&self) -> &'static str {
        self.inner().id()
    }

    fn is_valid(&self, value: &str) -> bool {
        self.inner().is_valid(value)
    }

    fn is_version(&self, value: &str) -> bool {
        self.inner().is_version(value)
    }

    fn is_single_version(&self, value: &str) -> bool {
        self.inner().is_single_version(value)
    }

    fn is_stable(&self, version: &str) -> bool {
        self.inner().is_stable(version)
    }

    fn is_greater_than(&self, version: &str, other: &str) -> bool {
        self.inner().is_greater_than(version, other)
    }

    fn matches(&self, version: &str, range: &str) -> bool {
        self.inner().matches(version, range)
    }

    fn is_compatible(&self, version: &str, current_value: &str) -> bool {
        self.inner().is_compatible(version, current_value)
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        self.inner().sort_versions(a, b)
    }

    fn get_new_value(&self, request: &NewValueRequest<'_>) -> Option<String> {
        self.inner().get_new_value(request)
    }

    fn get_major(&self, version: &str) -> Option<u64> {
        self.inner().get_major(version)
    }

    fn get_minor(&self, version: &str) -> Option<u64> {
        self.inner().get_minor(version)
    }

    fn get_patch(&self, version: &str) -> Option<u64> {
        self.inner().get_patch(version)
    }

    fn get_satisfying_version(&self, versions: &[String], range: &str) -> Option<String> {
        self.inner().get_satisfying_version(versions, range)
    }

    fn min_satisfying_version(&self, versions: &[String], range: &str) -> Option<String> {
        self.inner().min_satisfying_version(versions, range)
    }

    fn is_less_than_range(&self, version: &str, range: &str) -> Option<bool> {
        self.inner().is_less_than_range(version, range)
    }

    fn value_to_version(&self, value: &str) -> Option<String> {
        self.inner().value_to_version(value)
    }
}
