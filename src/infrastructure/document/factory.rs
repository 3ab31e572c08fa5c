//! Document backend selection from configuration

use std::sync::Arc;

use tracing::info;

use super::github::{GitHubBackendConfig, GitHubDocumentBackend};
use super::in_memory::InMemoryDocumentBackend;
use crate::config::{GitHubConfig, StorageConfig};
use crate::domain::{DocumentBackend, DomainError};

/// Supported document backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentBackendType {
    /// GitHub repository contents API
    GitHub,
    /// Process-local (for development/testing)
    InMemory,
}

impl DocumentBackendType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" | "gh" => Some(Self::GitHub),
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            _ => None,
        }
    }
}

/// Factory for document backends
#[derive(Debug)]
pub struct DocumentBackendFactory;

impl DocumentBackendFactory {
    pub fn create(
        storage: &StorageConfig,
        github: &GitHubConfig,
    ) -> Result<Arc<dyn DocumentBackend>, DomainError> {
        let backend_type = DocumentBackendType::from_str(&storage.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage backend '{}'", storage.backend))
        })?;

        info!(backend = ?backend_type, "Creating document backend");

        match backend_type {
            DocumentBackendType::InMemory => Ok(Arc::new(InMemoryDocumentBackend::new())),
            DocumentBackendType::GitHub => Ok(Arc::new(Self::create_github(github)?)),
        }
    }

    fn create_github(github: &GitHubConfig) -> Result<GitHubDocumentBackend, DomainError> {
        let token = github
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::configuration("GitHub token is not set"))?;

        if github.owner.is_empty() || github.repo.is_empty() {
            return Err(DomainError::configuration(
                "GitHub owner and repo must be configured",
            ));
        }

        let mut config = GitHubBackendConfig::new(&github.owner, &github.repo, token)
            .with_api_url(&github.api_url)
            .with_timeout(github.timeout());

        if let Some(branch) = &github.branch {
            config = config.with_branch(branch);
        }

        GitHubDocumentBackend::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!(DocumentBackendType::from_str("GitHub"), Some(DocumentBackendType::GitHub));
        assert_eq!(DocumentBackendType::from_str("memory"), Some(DocumentBackendType::InMemory));
        assert_eq!(DocumentBackendType::from_str("postgres"), None);
    }

    #[test]
    fn test_memory_backend() {
        let storage = StorageConfig {
            backend: "memory".to_string(),
        };

        let backend = DocumentBackendFactory::create(&storage, &GitHubConfig::default()).unwrap();
        assert_eq!(backend.backend_name(), "memory");
    }

    #[test]
    fn test_github_requires_token() {
        let storage = StorageConfig::default();
        let github = GitHubConfig {
            owner: "acme".to_string(),
            repo: "panel".to_string(),
            ..GitHubConfig::default()
        };

        let err = DocumentBackendFactory::create(&storage, &github).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_github_backend() {
        let storage = StorageConfig::default();
        let github = GitHubConfig {
            owner: "acme".to_string(),
            repo: "panel".to_string(),
            token: Some("ghp_x".to_string()),
            branch: Some("data".to_string()),
            ..GitHubConfig::default()
        };

        let backend = DocumentBackendFactory::create(&storage, &github).unwrap();
        assert_eq!(backend.backend_name(), "github");
    }

    #[test]
    fn test_unknown_backend() {
        let storage = StorageConfig {
            backend: "s3".to_string(),
        };

        assert!(DocumentBackendFactory::create(&storage, &GitHubConfig::default()).is_err());
    }
}
