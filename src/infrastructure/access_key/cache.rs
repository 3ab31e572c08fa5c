//! Read cache for the validation path
//!
//! Holds one snapshot of the key collection. Within the TTL the snapshot is
//! served without touching the backend; after that the backend is asked
//! conditionally (revalidation tag), and any failure falls back to the last
//! snapshot, however old.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{DocumentBackend, FetchOutcome, KeyCollection};

/// Replaced wholesale, never mutated in place
#[derive(Debug, Default)]
struct CacheSnapshot {
    data: Option<Arc<KeyCollection>>,
    fetched_at: Option<Instant>,
    revalidation_tag: Option<String>,
}

impl CacheSnapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        match (&self.data, self.fetched_at) {
            (Some(_), Some(fetched_at)) => fetched_at.elapsed() < ttl,
            _ => false,
        }
    }
}

/// Time-boxed, conditionally revalidated copy of the key collection.
///
/// Never authoritative for writes: write paths go through
/// [`KeyStore`](super::KeyStore) and its version token.
#[derive(Debug)]
pub struct ReadCache {
    backend: Arc<dyn DocumentBackend>,
    path: String,
    ttl: Duration,
    snapshot: RwLock<Arc<CacheSnapshot>>,
}

impl ReadCache {
    /// Create an empty cache
    pub fn new(backend: Arc<dyn DocumentBackend>, path: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            path: path.into(),
            ttl,
            snapshot: RwLock::new(Arc::new(CacheSnapshot::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current collection, or `None` if it has never been obtained
    pub async fn get(&self) -> Option<Arc<KeyCollection>> {
        let current = self.snapshot.read().await.clone();

        if current.is_fresh(self.ttl) {
            debug!(path = %self.path, "Key cache hit");
            return current.data.clone();
        }

        let tag = current
            .data
            .as_ref()
            .and(current.revalidation_tag.as_deref());

        match self.backend.fetch(&self.path, tag).await {
            Ok(FetchOutcome::NotModified) => match &current.data {
                Some(data) => {
                    debug!(path = %self.path, "Key cache revalidated");
                    self.replace(CacheSnapshot {
                        data: Some(data.clone()),
                        fetched_at: Some(Instant::now()),
                        revalidation_tag: current.revalidation_tag.clone(),
                    })
                    .await;
                    Some(data.clone())
                }
                None => None,
            },
            Ok(FetchOutcome::Found(document)) => {
                match KeyCollection::from_document(&document.content) {
                    Ok(keys) => {
                        debug!(path = %self.path, records = keys.len(), "Key cache refreshed");
                        let data = Arc::new(keys);
                        self.replace(CacheSnapshot {
                            data: Some(data.clone()),
                            fetched_at: Some(Instant::now()),
                            revalidation_tag: document.revalidation_tag,
                        })
                        .await;
                        Some(data)
                    }
                    Err(e) => {
                        warn!(path = %self.path, error = %e, "Fetched key document is unusable, serving last snapshot");
                        current.data.clone()
                    }
                }
            }
            Ok(FetchOutcome::Missing) => {
                debug!(path = %self.path, "Key document missing, caching empty collection");
                let data = Arc::new(KeyCollection::new());
                self.replace(CacheSnapshot {
                    data: Some(data.clone()),
                    fetched_at: Some(Instant::now()),
                    revalidation_tag: None,
                })
                .await;
                Some(data)
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "Key fetch failed, serving last snapshot");
                current.data.clone()
            }
        }
    }

    /// Force the next [`get`](Self::get) to revalidate.
    ///
    /// Data and revalidation tag are kept, so revalidation stays cheap and
    /// the fallback snapshot survives a backend outage.
    pub async fn mark_stale(&self) {
        let mut guard = self.snapshot.write().await;
        let stale = CacheSnapshot {
            data: guard.data.clone(),
            fetched_at: None,
            revalidation_tag: guard.revalidation_tag.clone(),
        };
        *guard = Arc::new(stale);
    }

    async fn replace(&self, snapshot: CacheSnapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
    }
}
