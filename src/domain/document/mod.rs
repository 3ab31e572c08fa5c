//! Remote document backend contract
//!
//! A versioned, whole-document store: reads return content plus a version
//! token, writes must present the last-seen token and are rejected when the
//! document changed in between.

mod backend;

pub use backend::{DocumentBackend, FetchOutcome, FetchedDocument, VersionToken};
