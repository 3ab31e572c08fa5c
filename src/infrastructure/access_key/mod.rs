//! Access key infrastructure
//!
//! The versioned key store, the read cache in front of it, key generation,
//! and the lifecycle service that ties them to the messaging relay.

mod cache;
mod generator;
mod service;
mod store;

pub use cache::ReadCache;
pub use generator::AccessKeyGenerator;
pub use service::{AccessKeyService, AccessKeyServiceConfig, SendOutcome};
pub use store::{KeyStore, LoadedKeys};
