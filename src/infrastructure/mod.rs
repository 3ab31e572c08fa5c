//! Infrastructure layer - Backends, relays and the services built on them

pub mod access_key;
pub mod document;
pub mod logging;
pub mod relay;
