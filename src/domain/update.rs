//! Proposed update types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change an update proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateType {
    /// Replace a range with the exact current version
    Pin,
    /// Add a digest to a reference that has none
    PinDigest,
    /// Same value, newer digest
    Digest,
    /// Package was renamed or moved
    Replacement,
    /// Downgrade because nothing satisfies the current constraint
    Rollback,
    Major,
    Minor,
    Patch,
    /// Range rewritten to raise its floor
    Bump,
}

impl UpdateType {
    /// Returns the serialized name of this update type
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Pin => "pin",
            UpdateType::PinDigest => "pinDigest",
            UpdateType::Digest => "digest",
            UpdateType::Replacement => "replacement",
            UpdateType::Rollback => "rollback",
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Bump => "bump",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of digest resolution for an update
///
/// `Option<NewDigest>::None` means no digest was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewDigest {
    Resolved(String),
    /// The provider was asked and could not produce a digest
    Unavailable,
}

impl NewDigest {
    /// Returns the digest if it was resolved
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            NewDigest::Resolved(digest) => Some(digest),
            NewDigest::Unavailable => None,
        }
    }
}

/// One proposed change for a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub update_type: UpdateType,
    /// Grouping key the release was chosen from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// New manifest value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_digest: Option<NewDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_major: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_minor: Option<u64>,
    /// New package name (replacement updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_pin: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_pin_digest: bool,
    /// Only the lock file changes; the manifest value stays the same
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_lockfile_update: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_bump: bool,
    /// New value is a range rather than a plain version
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_range: bool,
    /// Chosen release has not cleared the gating checks yet
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pending_checks: bool,
    /// Newer releases held back by the gating checks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
}

impl Update {
    /// Creates an empty update of the given type
    pub fn new(update_type: UpdateType) -> Self {
        Self {
            update_type,
            bucket: None,
            new_value: None,
            new_version: None,
            new_digest: None,
            new_major: None,
            new_minor: None,
            new_name: None,
            is_pin: false,
            is_pin_digest: false,
            is_lockfile_update: false,
            is_bump: false,
            is_range: false,
            pending_checks: false,
            pending_versions: Vec::new(),
            release_timestamp: None,
            registry_url: None,
        }
    }

    /// Sets the new manifest value (builder pattern)
    pub fn with_new_value(mut self, new_value: Option<String>) -> Self {
        self.new_value = new_value;
        self
    }

    /// Returns the resolved digest, if any
    pub fn resolved_digest(&self) -> Option<&str> {
        self.new_digest.as_ref().and_then(NewDigest::as_resolved)
    }

    /// Returns true if digest resolution was attempted and failed
    pub fn digest_unavailable(&self) -> bool {
        matches!(self.new_digest, Some(NewDigest::Unavailable))
    }
}
