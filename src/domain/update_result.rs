//! Lookup result types

use super::Update;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason why a dependency produced no updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Datasource is unknown or the config cannot be looked up
    InvalidConfig,
    /// Current value is not valid for the versioning scheme
    InvalidValue,
    /// Version is pinned (exact version specified)
    IsPinned,
    /// Resolved current version is not a version for the scheme
    InvalidVersion,
    /// Lookup failed unexpectedly
    InternalError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidConfig => write!(f, "invalid-config"),
            SkipReason::InvalidValue => write!(f, "invalid-value"),
            SkipReason::IsPinned => write!(f, "is-pinned"),
            SkipReason::InvalidVersion => write!(f, "invalid-version"),
            SkipReason::InternalError => write!(f, "internal-error"),
        }
    }
}

/// Non-fatal problem found during a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// What the message is about (usually the dependency name)
    pub topic: String,
    pub message: String,
}

impl ValidationMessage {
    /// Creates a new ValidationMessage
    pub fn new(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Result of looking up updates for a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Proposed updates in bucket order
    pub updates: Vec<Update>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Version the dependency is fixed to via lock or exact constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_single_version: bool,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    /// Versioning scheme id used for the lookup
    pub versioning: String,
}

impl UpdateResult {
    /// Creates an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a result that only carries a skip reason
    pub fn skip(reason: SkipReason) -> Self {
        Self {
            skip_reason: Some(reason),
            ..Self::default()
        }
    }

    /// Records a warning
    pub fn warn(&mut self, topic: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationMessage::new(topic, message));
    }

    /// Returns true if at least one update was proposed
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// Returns true if the lookup was skipped
    pub fn is_skip(&self) -> bool {
        self.skip_reason.is_some()
    }
}
