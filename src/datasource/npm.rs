//! npm Registry provider
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: https://registry.npmjs.org/{package}

use crate::datasource::{HttpClient, ReleaseProvider};
use crate::domain::{DependencyMetadata, LookupConfig, Release};
use crate::error::RegistryError;
use crate::versioning::{NpmVersioning, Versioning};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// npm registry base URL
const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm Registry provider
pub struct NpmDatasource {
    client: HttpClient,
    registry_url: String,
}

/// npm package metadata response
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default, rename = "dist-tags")]
    dist_tags: BTreeMap<String, String>,
    /// Version time information
    #[serde(default)]
    time: HashMap<String, String>,
    /// Available versions
    #[serde(default)]
    versions: HashMap<String, NpmVersionEntry>,
    #[serde(default)]
    repository: Option<NpmRepository>,
    #[serde(default)]
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NpmVersionEntry {
    /// Deprecation notice; npm uses a string, some mirrors a bool
    #[serde(default)]
    deprecated: Option<serde_json::Value>,
    /// Old packuments sometimes carry an array here
    #[serde(default)]
    engines: Option<serde_json::Value>,
}

impl NpmVersionEntry {
    fn deprecation(&self) -> Option<String> {
        match &self.deprecated {
            Some(serde_json::Value::String(message)) if !message.is_empty() => {
                Some(message.clone())
            }
            Some(serde_json::Value::Bool(true)) => Some("deprecated".to_string()),
            _ => None,
        }
    }

    fn engines(&self) -> BTreeMap<String, String> {
        match &self.engines {
            Some(serde_json::Value::Object(engines)) => engines
                .iter()
                .filter_map(|(tool, range)| Some((tool.clone(), range.as_str()?.to_string())))
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmRepository {
    Url(String),
    Detailed {
        url: Option<String>,
        directory: Option<String>,
    },
}

/// Turn a repository reference into a browsable https url
fn normalize_source_url(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);
    if let Some(rest) = url.strip_prefix("git://") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("ssh://git@") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("github:") {
        format!("https://github.com/{}", rest)
    } else {
        url.to_string()
    }
}

impl NpmDatasource {
    /// Create a new npm provider
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            registry_url: NPM_REGISTRY_URL.to_string(),
        }
    }

    /// Use a different registry (builder pattern)
    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = registry_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}", self.registry_url, package)
    }

    fn into_metadata(&self, response: NpmPackageResponse) -> DependencyMetadata {
        let mut releases: Vec<Release> = response
            .versions
            .iter()
            .map(|(version, entry)| Release {
                version: version.clone(),
                release_timestamp: response
                    .time
                    .get(version)
                    .and_then(|t| t.parse::<DateTime<Utc>>().ok()),
                is_deprecated: entry.deprecation().is_some(),
                registry_url: Some(self.registry_url.clone()),
                new_digest: None,
                constraints: entry.engines(),
            })
            .collect();
        releases.sort_by(|a, b| NpmVersioning.sort_versions(&a.version, &b.version));

        let (source_url, source_directory) = match response.repository {
            Some(NpmRepository::Url(url)) => (Some(normalize_source_url(&url)), None),
            Some(NpmRepository::Detailed { url, directory }) => {
                (url.as_deref().map(normalize_source_url), directory)
            }
            None => (None, None),
        };

        // A deprecated latest release means the whole package is deprecated
        let deprecation_message = response
            .dist_tags
            .get("latest")
            .and_then(|latest| response.versions.get(latest))
            .and_then(NpmVersionEntry::deprecation);

        DependencyMetadata {
            releases,
            tags: response.dist_tags,
            source_url,
            source_directory,
            homepage: response.homepage,
            deprecation_message,
            ..DependencyMetadata::default()
        }
    }
}

#[async_trait]
impl ReleaseProvider for NpmDatasource {
    fn id(&self) -> &str {
        "npm"
    }

    fn default_versioning(&self) -> &str {
        "npm"
    }

    async fn get_releases(
        &self,
        config: &LookupConfig,
    ) -> Result<Option<Arc<DependencyMetadata>>, RegistryError> {
        let package = config.lookup_name();
        let url = self.build_url(package);
        debug!(package, %url, "fetching npm metadata");

        match self
            .client
            .get_json::<NpmPackageResponse>(&url, package, self.id())
            .await
        {
            Ok(response) => Ok(Some(Arc::new(self.into_metadata(response)))),
            Err(RegistryError::PackageNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
