//! deplookup - dependency update lookup library
//!
//! This library works out which updates a dependency can receive:
//! - Release providers fetch versions, tags and digests from registries
//! - Versioning schemes interpret versions and constraints (npm, semver, loose)
//! - The lookup engine filters, buckets and gates candidates into updates
//! - The orchestrator runs lookups for a batch of dependencies in parallel

pub mod cli;
pub mod datasource;
pub mod domain;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod settings;
pub mod versioning;
