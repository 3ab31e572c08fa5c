//! Keyrelay Gateway
//!
//! Time-bounded access keys for a messaging relay:
//! - Keys live in a single versioned JSON document (GitHub contents API)
//! - Writes use optimistic concurrency on the document version
//! - Validation reads through a short-lived conditional cache
//! - Owners of expired keys get notified through the relay

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AppState, PanelCredentials};
use infrastructure::access_key::{AccessKeyService, AccessKeyServiceConfig, KeyStore, ReadCache};
use infrastructure::document::DocumentBackendFactory;
use infrastructure::relay::TelegramRelay;
use tracing::{info, warn};

/// Wire backends, cache, relay and service from configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let backend = DocumentBackendFactory::create(&config.storage, &config.github)?;
    info!(
        backend = backend.backend_name(),
        path = %config.github.path,
        "Document backend ready"
    );

    let store = Arc::new(KeyStore::new(backend.clone(), &config.github.path));
    let cache = Arc::new(ReadCache::new(
        backend,
        &config.github.path,
        config.cache.ttl(),
    ));
    info!(ttl_ms = config.cache.cache_duration_ms, "Read cache configured");

    let relay = Arc::new(TelegramRelay::new((&config.relay).into())?);

    let service = AccessKeyService::new(store, cache.clone(), relay)
        .with_config(AccessKeyServiceConfig::from(&config.relay));

    let panel = PanelCredentials::from(&config.panel);
    if !panel.is_configured() {
        warn!("Panel credentials are not configured; key management endpoints will refuse requests");
    }

    Ok(AppState::new(Arc::new(service), cache, panel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_with_memory_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = "memory".to_string();
        config.panel.username = Some("admin".to_string());
        config.panel.password = Some("pw".to_string());

        let state = create_app_state(&config).unwrap();

        assert!(state.panel.is_configured());
        assert!(state.access_key_service.list_keys().await.unwrap().is_empty());
    }

    #[test]
    fn test_github_backend_requires_token() {
        let mut config = AppConfig::default();
        config.github.owner = "acme".to_string();
        config.github.repo = "keys".to_string();
        config.github.token = None;

        let err = create_app_state(&config).err().unwrap();
        assert!(err.to_string().contains("token"));
    }
}
