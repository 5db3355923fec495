//! Shared release cache
//!
//! Wraps a provider so that concurrent lookups of the same package hit the
//! registry once per run. Lookups of a package already being fetched wait for
//! that fetch instead of starting their own. Cached metadata is handed out as
//! shared `Arc`s; consumers must clone before changing anything.

use crate::datasource::ReleaseProvider;
use crate::domain::{DependencyMetadata, LookupConfig};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::trace;

/// One package's entry; empty until a fetch finds the package
type Slot = Arc<OnceCell<Arc<DependencyMetadata>>>;

/// Caching wrapper around a release provider
pub struct CachedDatasource {
    inner: Arc<dyn ReleaseProvider>,
    entries: Mutex<HashMap<String, Slot>>,
}

impl CachedDatasource {
    /// Wrap `inner` with an empty cache
    pub fn new(inner: Arc<dyn ReleaseProvider>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached packages
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn slot(&self, key: &str) -> Slot {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(key.to_string()).or_default())
    }
}

#[async_trait]
impl ReleaseProvider for CachedDatasource {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn default_versioning(&self) -> &str {
        self.inner.default_versioning()
    }

    fn supports_digests(&self) -> bool {
        self.inner.supports_digests()
    }

    async fn get_releases(
        &self,
        config: &LookupConfig,
    ) -> Result<Option<Arc<DependencyMetadata>>, RegistryError> {
        let key = config.lookup_name();
        let slot = self.slot(key).await;
        if let Some(hit) = slot.get() {
            trace!(package = %key, "release cache hit");
            return Ok(Some(Arc::clone(hit)));
        }

        // Misses and errors leave the slot empty so a later lookup tries again
        let fetched = slot
            .get_or_try_init(|| async {
                match self.inner.get_releases(config).await {
                    Ok(Some(metadata)) => Ok(metadata),
                    Ok(None) => Err(None),
                    Err(e) => Err(Some(e)),
                }
            })
            .await;
        match fetched {
            Ok(metadata) => Ok(Some(Arc::clone(metadata))),
            Err(None) => Ok(None),
            Err(Some(e)) => Err(e),
        }
    }

    async fn get_digest(
        &self,
        config: &LookupConfig,
        new_value: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        self.inner.get_digest(config, new_value).await
    }
}
