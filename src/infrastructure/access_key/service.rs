//! Access key lifecycle service
//!
//! Create, extend and delete go load -> mutate -> commit against the key
//! store, with no lock across the two network calls; a lost race surfaces
//! as [`DomainError::WriteConflict`] for the caller to retry. Validation
//! reads through the cache and never fails: a missing or unreadable
//! collection simply makes every key invalid.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::domain::{
    validate_new_access_key, AccessKeyRecord, DomainError, KeyCollection, MessageRelay,
    NewAccessKey, OutboundMessage, RelayError, ValidationResult, VersionToken,
};

use super::cache::ReadCache;
use super::generator::AccessKeyGenerator;
use super::store::{KeyStore, LoadedKeys};

/// Message settings for the relay side of the service
#[derive(Debug, Clone)]
pub struct AccessKeyServiceConfig {
    /// Sent to the owner of a key that is used after expiry
    pub expiry_message: String,
    /// Appended to relayed messages after a blank line
    pub message_footer: Option<String>,
    /// Markup mode for relayed messages
    pub parse_mode: Option<String>,
}

impl Default for AccessKeyServiceConfig {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for AccessKeyServiceConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            expiry_message: config.expiry_message.clone(),
            message_footer: config.message_footer.clone(),
            parse_mode: config.parse_mode.clone(),
        }
    }
}

/// Result of relaying a message on behalf of an access key
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Delivered,
    /// Unknown key, or the key collection could not be obtained
    Invalid,
    /// Known key past its expiry; the owner has been notified
    Expired,
    RelayFailed(RelayError),
}

/// Access key lifecycle service
pub struct AccessKeyService {
    store: Arc<KeyStore>,
    cache: Arc<ReadCache>,
    relay: Arc<dyn MessageRelay>,
    generator: AccessKeyGenerator,
    config: AccessKeyServiceConfig,
}

impl AccessKeyService {
    pub fn new(store: Arc<KeyStore>, cache: Arc<ReadCache>, relay: Arc<dyn MessageRelay>) -> Self {
        Self {
            store,
            cache,
            relay,
            generator: AccessKeyGenerator::default(),
            config: AccessKeyServiceConfig::default(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: AccessKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_config(mut self, config: AccessKeyServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// All keys, read from the store rather than the cache
    pub async fn list_keys(&self) -> Result<KeyCollection, DomainError> {
        Ok(self.store.load().await?.keys)
    }

    /// Issue a new key valid for `request.duration_days` days
    pub async fn create_key(&self, request: NewAccessKey) -> Result<AccessKeyRecord, DomainError> {
        validate_new_access_key(&request)?;
        info!(name = %request.name, days = request.duration_days, "Creating access key");

        let LoadedKeys { mut keys, version } = self.store.load().await?;

        let access_key = self.generator.generate_unique(&keys)?;
        let record = AccessKeyRecord::issue(access_key, &request, Utc::now());
        keys.push(record.clone());

        self.commit(
            &keys,
            version.as_ref(),
            &format!("[Panel] Create key: {}", record.name()),
        )
        .await?;

        info!(
            key = %record.key_prefix(),
            expires_at = %record.expires_at(),
            "Access key created"
        );
        Ok(record)
    }

    /// Add 30 days, counted from the later of now and the current expiry
    pub async fn extend_key(&self, access_key: &str) -> Result<AccessKeyRecord, DomainError> {
        let LoadedKeys { mut keys, version } = self.store.load().await?;

        let record = keys
            .find_mut(access_key)
            .ok_or_else(|| not_found(access_key))?;
        record.extend(Utc::now());
        let record = record.clone();

        self.commit(
            &keys,
            version.as_ref(),
            &format!("[Panel] Extend key: {}", record.name()),
        )
        .await?;

        info!(
            key = %record.key_prefix(),
            expires_at = %record.expires_at(),
            "Access key extended"
        );
        Ok(record)
    }

    /// Remove the key with exactly this access key
    pub async fn delete_key(&self, access_key: &str) -> Result<(), DomainError> {
        let LoadedKeys { mut keys, version } = self.store.load().await?;

        let removed = keys.remove(access_key).ok_or_else(|| not_found(access_key))?;

        self.commit(
            &keys,
            version.as_ref(),
            &format!("[Panel] Delete key: {}", access_key),
        )
        .await?;

        info!(key = %removed.key_prefix(), name = %removed.name(), "Access key deleted");
        Ok(())
    }

    /// Check a key on the relay path.
    ///
    /// An expired key triggers a detached notification to its owner; the
    /// outcome of that notification never reaches the caller.
    pub async fn validate(&self, access_key: &str) -> ValidationResult {
        let Some(keys) = self.cache.get().await else {
            warn!("Key collection unavailable, treating key as invalid");
            return ValidationResult::Invalid;
        };

        let Some(record) = keys.find(access_key) else {
            debug!(
                key_prefix = %access_key.chars().take(12).collect::<String>(),
                "Unknown access key"
            );
            return ValidationResult::Invalid;
        };

        if record.is_expired_at(Utc::now()) {
            self.notify_expired(record);
            return ValidationResult::Expired(record.clone());
        }

        ValidationResult::Valid(record.clone())
    }

    /// Validate `access_key` and, if valid, relay `text` through the key's bot
    pub async fn send_message(&self, access_key: &str, text: &str) -> SendOutcome {
        let record = match self.validate(access_key).await {
            ValidationResult::Valid(record) => record,
            ValidationResult::Invalid => return SendOutcome::Invalid,
            ValidationResult::Expired(_) => return SendOutcome::Expired,
        };

        let message = OutboundMessage {
            text: self.compose(text),
            parse_mode: self.config.parse_mode.clone(),
        };

        match self
            .relay
            .send_message(record.bot_token(), record.chat_id(), &message)
            .await
        {
            Ok(()) => {
                debug!(key = %record.key_prefix(), "Message relayed");
                SendOutcome::Delivered
            }
            Err(e) => {
                warn!(key = %record.key_prefix(), error = %e, "Message relay failed");
                SendOutcome::RelayFailed(e)
            }
        }
    }

    async fn commit(
        &self,
        keys: &KeyCollection,
        version: Option<&VersionToken>,
        change: &str,
    ) -> Result<(), DomainError> {
        self.store.save(keys, version, change).await?;
        self.cache.mark_stale().await;
        Ok(())
    }

    fn compose(&self, text: &str) -> String {
        match self.config.message_footer.as_deref() {
            Some(footer) if !footer.is_empty() => format!("{}\n\n{}", text, footer),
            _ => text.to_string(),
        }
    }

    fn notify_expired(&self, record: &AccessKeyRecord) {
        let relay = self.relay.clone();
        let bot_token = record.bot_token().to_string();
        let chat_id = record.chat_id().to_string();
        let key_prefix = record.key_prefix();
        let message = OutboundMessage::plain(self.config.expiry_message.clone());

        info!(key = %key_prefix, expires_at = %record.expires_at(), "Expired access key used, notifying owner");

        // Fire-and-forget: the caller's response does not wait on this
        tokio::spawn(async move {
            if let Err(e) = relay.send_message(&bot_token, &chat_id, &message).await {
                warn!(key = %key_prefix, error = %e, "Failed to send expiry notification");
            }
        });
    }
}

fn not_found(access_key: &str) -> DomainError {
    DomainError::not_found(format!("Access key '{}' not found", access_key))
}
