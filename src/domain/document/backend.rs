use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Opaque identifier of one exact revision of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document as read from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Raw document bytes
    pub content: Vec<u8>,
    /// Token to present on the next conditional write
    pub version: VersionToken,
    /// Marker for a later conditional read, if the backend issued one
    pub revalidation_tag: Option<String>,
}

/// Result of a (possibly conditional) fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(FetchedDocument),
    /// The revalidation tag presented still matches
    NotModified,
    /// No document at this path yet
    Missing,
}

/// Remote, version-tagged document store
#[async_trait]
pub trait DocumentBackend: Send + Sync + Debug {
    /// Read the document at `path`.
    ///
    /// With a `revalidation_tag`, the backend may answer
    /// [`FetchOutcome::NotModified`] instead of transferring the content.
    /// Transport and unexpected HTTP failures are
    /// [`DomainError::BackendUnavailable`].
    async fn fetch(
        &self,
        path: &str,
        revalidation_tag: Option<&str>,
    ) -> Result<FetchOutcome, DomainError>;

    /// Replace the document at `path` if it is still at `expected`.
    ///
    /// `expected = None` means "create": the write fails if the document
    /// already exists. A stale token yields [`DomainError::WriteConflict`].
    /// Returns the version token of the new revision.
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, DomainError>;

    /// Short backend name for logs and health checks
    fn backend_name(&self) -> &'static str;
}
