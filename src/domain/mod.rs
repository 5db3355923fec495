//! Core domain models for deplookup
//!
//! This module contains the fundamental types used throughout the application:
//! - Releases and dependency metadata returned by release providers
//! - Lookup configuration and package rules
//! - Proposed updates and lookup results

mod lookup_config;
mod package_rule;
mod release;
mod update;
mod update_result;

pub use lookup_config::{ChecksFilter, LookupConfig, RangeStrategy};
pub use package_rule::{apply_package_rules, PackageRule, RuleOverrides};
pub use release::{DependencyMetadata, Release};
pub use update::{NewDigest, Update, UpdateType};
pub use update_result::{SkipReason, UpdateResult, ValidationMessage};
