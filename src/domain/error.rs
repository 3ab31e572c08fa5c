use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Lost an optimistic-concurrency race against another writer.
    #[error("Write conflict: {message}")]
    WriteConflict { message: String },

    #[error("Backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Malformed document: {message}")]
    MalformedDocument { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn write_conflict(message: impl Into<String>) -> Self {
        Self::WriteConflict {
            message: message.into(),
        }
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may reasonably retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::WriteConflict { .. } | Self::BackendUnavailable { .. }
        )
    }
}
