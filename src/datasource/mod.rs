//! Release providers
//!
//! This module provides:
//! - The [`ReleaseProvider`] trait the lookup engine fetches releases through
//! - HTTP client shared foundation with retry logic
//! - npm registry provider
//! - Fixture provider backed by in-memory data or a JSON file
//! - Shared cache wrapper

mod cache;
mod client;
mod fixture;
mod npm;

pub use cache::CachedDatasource;
pub use client::HttpClient;
pub use fixture::{load_fixtures, FixtureDatasource, FixtureSpec};
pub use npm::NpmDatasource;

use crate::domain::{DependencyMetadata, LookupConfig, Release};
use crate::error::RegistryError;
use crate::versioning::range::Range;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Source of releases and digests for one datasource id
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// Datasource id (e.g., "npm")
    fn id(&self) -> &str;

    /// Versioning scheme used when the config does not name one
    fn default_versioning(&self) -> &str;

    /// Whether [`ReleaseProvider::get_digest`] can return anything
    fn supports_digests(&self) -> bool {
        false
    }

    /// Fetch everything known about a package.
    ///
    /// Returns `Ok(None)` when the registry does not know the package.
    async fn get_releases(
        &self,
        config: &LookupConfig,
    ) -> Result<Option<Arc<DependencyMetadata>>, RegistryError>;

    /// Resolve the digest for `new_value`, or the current reference when None
    async fn get_digest(
        &self,
        _config: &LookupConfig,
        _new_value: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        Ok(None)
    }
}

/// Release providers by datasource id
#[derive(Clone, Default)]
pub struct DatasourceRegistry {
    providers: HashMap<String, Arc<dyn ReleaseProvider>>,
}

impl DatasourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every network provider, each behind a shared cache
    pub fn with_defaults(client: HttpClient) -> Self {
        Self::new().with_provider(Arc::new(CachedDatasource::new(Arc::new(
            NpmDatasource::new(client),
        ))))
    }

    /// Register a provider under its id (builder pattern)
    pub fn with_provider(mut self, provider: Arc<dyn ReleaseProvider>) -> Self {
        self.providers.insert(provider.id().to_string(), provider);
        self
    }

    /// Get the provider for a datasource id
    pub fn get(&self, id: &str) -> Option<Arc<dyn ReleaseProvider>> {
        self.providers.get(id).cloned()
    }

    /// Registered datasource ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Whether a release's tool requirements admit the configured tool versions.
///
/// Tool values and requirements use the npm range grammar. A configured range
/// stands for its floor. Tools the release or the config does not mention,
/// and values that do not parse, never exclude a release.
pub fn satisfies_constraints(release: &Release, constraints: &BTreeMap<String, String>) -> bool {
    constraints.iter().all(|(tool, wanted)| {
        let Some(required) = release.constraints.get(tool) else {
            return true;
        };
        let floor = Range::parse(wanted).and_then(|range| range.floor());
        match (floor, Range::parse(required)) {
            (Some(floor), Some(required)) => required.satisfies(&floor),
            _ => true,
        }
    })
}

/// Drops releases whose tool requirements rule out the configured tools
pub fn filter_by_constraints(
    metadata: &mut DependencyMetadata,
    constraints: &BTreeMap<String, String>,
) {
    if constraints.is_empty() {
        return;
    }
    metadata.releases.retain(|release| {
        let admitted = satisfies_constraints(release, constraints);
        if !admitted {
            trace!(version = %release.version, "release requires other tool versions");
        }
        admitted
    });
}
