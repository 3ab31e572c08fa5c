//! API middleware components

pub mod panel_auth;

pub use panel_auth::RequirePanel;
