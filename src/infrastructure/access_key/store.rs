//! Key store: the whole key collection as one versioned document
//!
//! Reads return the collection together with the version token they saw;
//! writes present that token and fail with
//! [`DomainError::WriteConflict`] if another writer committed first. No
//! merging and no retries happen here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{DocumentBackend, DomainError, FetchOutcome, KeyCollection, VersionToken};

/// A collection together with the revision it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedKeys {
    pub keys: KeyCollection,
    /// `None` when the document does not exist yet
    pub version: Option<VersionToken>,
}

/// Authoritative read/write access to the key document
#[derive(Debug)]
pub struct KeyStore {
    backend: Arc<dyn DocumentBackend>,
    path: String,
}

impl KeyStore {
    pub fn new(backend: Arc<dyn DocumentBackend>, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch and decode the current collection.
    ///
    /// A missing document loads as empty with no version. Content that does
    /// not decode loads as empty but keeps the version that was read, so
    /// the next save replaces the broken revision instead of failing to
    /// find it.
    pub async fn load(&self) -> Result<LoadedKeys, DomainError> {
        match self.backend.fetch(&self.path, None).await? {
            FetchOutcome::Missing => {
                debug!(path = %self.path, "Key document missing, starting empty");
                Ok(LoadedKeys {
                    keys: KeyCollection::new(),
                    version: None,
                })
            }
            FetchOutcome::NotModified => Err(DomainError::backend_unavailable(
                "Backend answered 'not modified' to an unconditional read",
            )),
            FetchOutcome::Found(document) => {
                let keys = match KeyCollection::from_document(&document.content) {
                    Ok(keys) => keys,
                    Err(e) => {
                        warn!(
                            path = %self.path,
                            version = %document.version,
                            error = %e,
                            "Key document is not a valid collection, treating as empty"
                        );
                        KeyCollection::new()
                    }
                };

                Ok(LoadedKeys {
                    keys,
                    version: Some(document.version),
                })
            }
        }
    }

    /// Commit `keys` on top of `version`, returning the new version.
    ///
    /// `change` is the commit message recorded by the backend.
    pub async fn save(
        &self,
        keys: &KeyCollection,
        version: Option<&VersionToken>,
        change: &str,
    ) -> Result<VersionToken, DomainError> {
        let content = keys.to_document()?;

        match self
            .backend
            .write(&self.path, &content, version, change)
            .await
        {
            Ok(committed) => {
                info!(
                    path = %self.path,
                    change = %change,
                    version = %committed,
                    records = keys.len(),
                    "Key document committed"
                );
                Ok(committed)
            }
            Err(e @ DomainError::WriteConflict { .. }) => {
                warn!(path = %self.path, change = %change, error = %e, "Key document write lost a race");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
