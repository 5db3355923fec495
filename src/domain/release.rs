//! Release information from registries
//!
//! This module provides the Release struct that represents one published
//! version and the DependencyMetadata a release provider returns for a package.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single published version of a package
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Release {
    /// The version string (e.g., "1.2.3")
    pub version: String,
    /// When this version was released, if the registry reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_timestamp: Option<DateTime<Utc>>,
    /// Whether the registry marks this version as deprecated (or yanked)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_deprecated: bool,
    /// Registry the release was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
    /// Digest already known for this release
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_digest: Option<String>,
    /// Tool requirements of this release (e.g., npm `engines`: node -> ">=18")
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, String>,
}

impl Release {
    /// Create a new Release with only a version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the release timestamp
    pub fn with_timestamp(mut self, released_at: DateTime<Utc>) -> Self {
        self.release_timestamp = Some(released_at);
        self
    }

    /// Mark the release as deprecated
    pub fn deprecated(mut self) -> Self {
        self.is_deprecated = true;
        self
    }

    /// Require a tool version range for this release
    pub fn with_constraint(mut self, tool: impl Into<String>, range: impl Into<String>) -> Self {
        self.constraints.insert(tool.into(), range.into());
        self
    }
}

/// Everything a release provider knows about a package
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyMetadata {
    /// All known releases, in registry order
    pub releases: Vec<Release>,
    /// Distribution tags (e.g., "latest" -> "1.2.3")
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_url: Option<String>,
    /// Package-level deprecation notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    /// Name the package has been renamed/moved to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_name: Option<String>,
    /// Version to use together with `replacement_name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_version: Option<String>,
}

impl DependencyMetadata {
    /// Create metadata from a list of releases
    pub fn from_releases(releases: Vec<Release>) -> Self {
        Self {
            releases,
            ..Self::default()
        }
    }

    /// Add a distribution tag
    pub fn with_tag(mut self, tag: impl Into<String>, version: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), version.into());
        self
    }

    /// Version the `latest` tag points at
    pub fn latest_tag(&self) -> Option<&str> {
        self.tags.get("latest").map(String::as_str)
    }
}
