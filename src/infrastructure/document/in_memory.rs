//! In-memory document backend

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::domain::{DocumentBackend, DomainError, FetchOutcome, FetchedDocument, VersionToken};

/// Process-local document store with the same conditional-write contract
/// as the remote backend.
///
/// Version tokens are content hashes; revalidation tags are the quoted
/// token, the way HTTP entity tags look.
#[derive(Debug, Default)]
pub struct InMemoryDocumentBackend {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    fetch_count: AtomicUsize,
    write_count: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryDocumentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a document in place without a conditional check
    pub async fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionToken {
        let content = content.into();
        let version = version_of(&content);
        self.documents.write().await.insert(path.to_string(), content);
        version
    }

    /// Current content at `path`
    pub async fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.documents.read().await.get(path).cloned()
    }

    /// Number of fetch calls made so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of write calls made so far, including rejected ones
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Make every call fail as if the backend could not be reached
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::backend_unavailable(
                "In-memory backend configured to be unavailable",
            ));
        }
        Ok(())
    }
}

fn version_of(content: &[u8]) -> VersionToken {
    let mut hasher = Sha256::new();
    hasher.update(content);
    VersionToken::new(hex::encode(hasher.finalize()))
}

fn entity_tag(version: &VersionToken) -> String {
    format!("\"{}\"", version)
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentBackend {
    async fn fetch(
        &self,
        path: &str,
        revalidation_tag: Option<&str>,
    ) -> Result<FetchOutcome, DomainError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let documents = self.documents.read().await;

        let Some(content) = documents.get(path) else {
            return Ok(FetchOutcome::Missing);
        };

        let version = version_of(content);
        let tag = entity_tag(&version);

        if revalidation_tag == Some(tag.as_str()) {
            return Ok(FetchOutcome::NotModified);
        }

        Ok(FetchOutcome::Found(FetchedDocument {
            content: content.clone(),
            version,
            revalidation_tag: Some(tag),
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        _message: &str,
    ) -> Result<VersionToken, DomainError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut documents = self.documents.write().await;
        let current = documents.get(path).map(|c| version_of(c));

        match (current.as_ref(), expected) {
            (None, None) => {}
            (Some(current), Some(expected)) if current == expected => {}
            (Some(_), None) => {
                return Err(DomainError::write_conflict(format!(
                    "'{}' was created by another writer",
                    path
                )));
            }
            (None, Some(_)) => {
                return Err(DomainError::write_conflict(format!(
                    "'{}' no longer exists",
                    path
                )));
            }
            (Some(_), Some(expected)) => {
                return Err(DomainError::write_conflict(format!(
                    "'{}' changed since version {}",
                    path, expected
                )));
            }
        }

        let version = version_of(content);
        documents.insert(path.to_string(), content.to_vec());

        Ok(version)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
