//! Application state for shared services

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::config::PanelConfig;
use crate::infrastructure::access_key::{AccessKeyService, ReadCache};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub access_key_service: Arc<AccessKeyService>,
    /// Same cache the service validates through; used by readiness checks
    pub read_cache: Arc<ReadCache>,
    pub panel: Arc<PanelCredentials>,
}

impl AppState {
    pub fn new(
        access_key_service: Arc<AccessKeyService>,
        read_cache: Arc<ReadCache>,
        panel: PanelCredentials,
    ) -> Self {
        Self {
            access_key_service,
            read_cache,
            panel: Arc::new(panel),
        }
    }
}

/// Static operator credentials for the management panel
#[derive(Debug, Clone, Default)]
pub struct PanelCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl PanelCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Both a username and a non-empty password are set
    pub fn is_configured(&self) -> bool {
        matches!(
            (&self.username, &self.password),
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty()
        )
    }

    /// Check a login attempt. Always false when no credentials are configured.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let (Some(expected_user), Some(expected_pass)) = (&self.username, &self.password) else {
            return false;
        };

        if !self.is_configured() {
            return false;
        }

        // Evaluate both so timing does not reveal which one failed
        let user_ok = constant_time_compare(username, expected_user);
        let pass_ok = constant_time_compare(password, expected_pass);
        user_ok & pass_ok
    }
}

impl From<&PanelConfig> for PanelCredentials {
    fn from(config: &PanelConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Compare fixed-size digests so the input length does not leak either
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
