//! Access key generation
//!
//! Keys look like `key-<base36 millis><random>`: the timestamp keeps them
//! roughly sortable by creation, the random part comes from the OS CSPRNG.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rand::RngCore;

use crate::domain::{DomainError, KeyCollection};

const MAX_ATTEMPTS: usize = 8;

/// Generator for access keys
#[derive(Debug, Clone)]
pub struct AccessKeyGenerator {
    /// Prefix for all generated keys
    prefix: String,
    /// Number of random bytes in each key
    random_bytes: usize,
}

impl AccessKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            random_bytes: 12,
        }
    }

    /// Set the number of random bytes
    pub fn with_random_bytes(mut self, bytes: usize) -> Self {
        self.random_bytes = bytes;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new access key
    pub fn generate(&self) -> String {
        let mut random = vec![0u8; self.random_bytes];
        rand::rngs::OsRng.fill_bytes(&mut random);

        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();

        format!(
            "{}{}{}",
            self.prefix,
            to_base36(millis),
            URL_SAFE_NO_PAD.encode(&random)
        )
    }

    /// Generate a key that does not collide with any key in `existing`
    pub fn generate_unique(&self, existing: &KeyCollection) -> Result<String, DomainError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = self.generate();
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(DomainError::internal(format!(
            "Could not generate a unique access key after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}

impl Default for AccessKeyGenerator {
    fn default() -> Self {
        Self::new("key-")
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();

    String::from_utf8(out).unwrap_or_default()
}
