//! Access key record and validity projection

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::validation::NewAccessKey;

/// Days added by a single extension
pub const EXTENSION_DAYS: i64 = 30;

/// A single access key, persisted as one element of the key document.
///
/// Field names follow the document's JSON layout (`accessKey`, `botToken`,
/// `chatId`, `createdAt`, `expiresAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyRecord {
    name: String,
    access_key: String,
    bot_token: String,
    #[serde(deserialize_with = "deserialize_chat_id")]
    chat_id: String,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    expires_at: DateTime<Utc>,
}

impl AccessKeyRecord {
    /// Build a record from all of its parts
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            access_key: access_key.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            created_at: truncate_to_millis(created_at),
            expires_at: truncate_to_millis(expires_at),
        }
    }

    /// Issue a fresh record expiring `duration_days` after `now`
    pub fn issue(access_key: impl Into<String>, request: &NewAccessKey, now: DateTime<Utc>) -> Self {
        let created_at = truncate_to_millis(now);

        Self {
            name: request.name.clone(),
            access_key: access_key.into(),
            bot_token: request.bot_token.clone(),
            chat_id: request.chat_id.clone(),
            created_at,
            expires_at: created_at + Duration::days(request.duration_days),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Short, log-safe form of the access key
    pub fn key_prefix(&self) -> String {
        self.access_key.chars().take(12).collect()
    }

    /// A record is expired strictly after its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        if self.is_expired_at(now) {
            KeyStatus::Expired
        } else {
            KeyStatus::Active
        }
    }

    /// Push the expiry out by [`EXTENSION_DAYS`], counting from whichever is
    /// later: now, or the current expiry. Returns the new expiry.
    pub fn extend(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let base = if now > self.expires_at {
            truncate_to_millis(now)
        } else {
            self.expires_at
        };

        self.expires_at = base + Duration::days(EXTENSION_DAYS);
        self.expires_at
    }
}

/// Computed state of a record; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    Active,
    Expired,
}

/// Outcome of checking an access key on the relay path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid(AccessKeyRecord),
    Invalid,
    Expired(AccessKeyRecord),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn record(&self) -> Option<&AccessKeyRecord> {
        match self {
            Self::Valid(record) | Self::Expired(record) => Some(record),
            Self::Invalid => None,
        }
    }
}

/// The document stores millisecond precision; keep in-memory values equal
/// to what a reload would produce.
fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

/// Chat IDs written by hand into the document are sometimes bare numbers.
pub fn deserialize_chat_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawChatId {
        Text(String),
        Number(i64),
    }

    Ok(match RawChatId::deserialize(deserializer)? {
        RawChatId::Text(text) => text,
        RawChatId::Number(number) => number.to_string(),
    })
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
