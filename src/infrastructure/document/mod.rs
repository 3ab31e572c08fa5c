//! Document backend implementations
//!
//! - GitHub repository contents API (the production backend)
//! - In-memory backend for local development and tests

mod factory;
mod github;
mod in_memory;

pub use factory::{DocumentBackendFactory, DocumentBackendType};
pub use github::{GitHubBackendConfig, GitHubDocumentBackend};
pub use in_memory::InMemoryDocumentBackend;
