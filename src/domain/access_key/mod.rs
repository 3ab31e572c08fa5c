//! Access key domain module
//!
//! Access key records, the key collection persisted as one document,
//! and the read-time validity projection.

mod collection;
mod entity;
mod validation;

pub use collection::KeyCollection;
pub use entity::{
    deserialize_chat_id, AccessKeyRecord, KeyStatus, ValidationResult, EXTENSION_DAYS,
};
pub use validation::{validate_new_access_key, AccessKeyValidationError, NewAccessKey};
