//! Domain layer - Core entities and collaborator contracts

pub mod access_key;
pub mod document;
pub mod error;
pub mod relay;

pub use access_key::{
    validate_new_access_key, AccessKeyRecord, AccessKeyValidationError, KeyCollection, KeyStatus,
    NewAccessKey, ValidationResult, EXTENSION_DAYS,
};
pub use document::{DocumentBackend, FetchOutcome, FetchedDocument, VersionToken};
pub use error::DomainError;
pub use relay::{MessageRelay, OutboundMessage, RelayError};
