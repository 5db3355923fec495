//! Fixture release provider
//!
//! Serves releases from memory. Used by tests and by the CLI's
//! `--releases` flag, which loads fixtures from a JSON file shaped like:
//!
//! ```json
//! {
//!   "npm": {
//!     "defaultVersioning": "npm",
//!     "packages": { "lodash": { "releases": [{ "version": "4.17.21" }], "tags": { "latest": "4.17.21" } } }
//!   },
//!   "docker": {
//!     "supportsDigests": true,
//!     "packages": { "node": { "releases": [{ "version": "20.1.0" }] } },
//!     "digests": { "node@20.1.0": "sha256:..." }
//!   }
//! }
//! ```

use crate::datasource::ReleaseProvider;
use crate::domain::{DependencyMetadata, LookupConfig};
use crate::error::{RegistryError, SettingsError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One datasource's entry in a fixture file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixtureSpec {
    pub default_versioning: Option<String>,
    pub supports_digests: bool,
    pub packages: HashMap<String, DependencyMetadata>,
    /// Digests keyed by `name@value`, or by `name` for the current reference
    pub digests: HashMap<String, String>,
    /// Packages whose lookup fails with a network error
    pub failing: Vec<String>,
}

/// In-memory release provider
#[derive(Debug)]
pub struct FixtureDatasource {
    id: String,
    default_versioning: String,
    supports_digests: bool,
    packages: HashMap<String, Arc<DependencyMetadata>>,
    digests: HashMap<String, String>,
    failing: HashSet<String>,
    release_calls: AtomicUsize,
}

impl FixtureDatasource {
    /// Create an empty provider answering for `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_versioning: "npm".to_string(),
            supports_digests: false,
            packages: HashMap::new(),
            digests: HashMap::new(),
            failing: HashSet::new(),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Create a provider from a fixture file entry
    pub fn from_spec(id: impl Into<String>, spec: FixtureSpec) -> Self {
        let mut datasource = Self::new(id);
        if let Some(versioning) = spec.default_versioning {
            datasource.default_versioning = versioning;
        }
        datasource.supports_digests = spec.supports_digests;
        datasource.packages = spec
            .packages
            .into_iter()
            .map(|(name, metadata)| (name, Arc::new(metadata)))
            .collect();
        datasource.digests = spec.digests;
        datasource.failing = spec.failing.into_iter().collect();
        datasource
    }

    /// Set the default versioning scheme (builder pattern)
    pub fn with_versioning(mut self, versioning: impl Into<String>) -> Self {
        self.default_versioning = versioning.into();
        self
    }

    /// Add a package (builder pattern)
    pub fn with_package(mut self, name: impl Into<String>, metadata: DependencyMetadata) -> Self {
        self.packages.insert(name.into(), Arc::new(metadata));
        self
    }

    /// Enable digest support and register a digest (builder pattern)
    pub fn with_digest(mut self, key: impl Into<String>, digest: impl Into<String>) -> Self {
        self.supports_digests = true;
        self.digests.insert(key.into(), digest.into());
        self
    }

    /// Enable digest support without registering any digest (builder pattern)
    pub fn with_digest_support(mut self) -> Self {
        self.supports_digests = true;
        self
    }

    /// Make lookups of `name` fail with a network error (builder pattern)
    pub fn with_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Number of `get_releases` calls served so far
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseProvider for FixtureDatasource {
    fn id(&self) -> &str {
        &self.id
    }

    fn default_versioning(&self) -> &str {
        &self.default_versioning
    }

    fn supports_digests(&self) -> bool {
        self.supports_digests
    }

    async fn get_releases(
        &self,
        config: &LookupConfig,
    ) -> Result<Option<Arc<DependencyMetadata>>, RegistryError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let name = config.lookup_name();
        if self.failing.contains(name) {
            return Err(RegistryError::network_error(
                name,
                &self.id,
                "connection refused",
            ));
        }
        Ok(self.packages.get(name).cloned())
    }

    async fn get_digest(
        &self,
        config: &LookupConfig,
        new_value: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        let name = config.lookup_name();
        let digest = new_value
            .and_then(|value| self.digests.get(&format!("{}@{}", name, value)))
            .or_else(|| self.digests.get(name));
        Ok(digest.cloned())
    }
}

/// Load a fixture file into one provider per datasource id
pub fn load_fixtures(path: &Path) -> Result<Vec<FixtureDatasource>, SettingsError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SettingsError::read_error(path, e))?;
    let specs: BTreeMap<String, FixtureSpec> = serde_json::from_str(&content)
        .map_err(|e| SettingsError::json_parse_error(path, e.to_string()))?;
    Ok(specs
        .into_iter()
        .map(|(id, spec)| FixtureDatasource::from_spec(id, spec))
        .collect())
}
