//! Access key input validation

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur while validating a key creation request
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccessKeyValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Bot token cannot be empty")]
    EmptyBotToken,

    #[error("Chat ID cannot be empty")]
    EmptyChatId,

    #[error("Duration must be a positive number of days, got {0}")]
    NonPositiveDuration(i64),

    #[error("Duration exceeds maximum of {0} days")]
    DurationTooLong(i64),
}

impl From<AccessKeyValidationError> for DomainError {
    fn from(err: AccessKeyValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Upper bound keeps `now + duration` far away from chrono's range limits.
const MAX_DURATION_DAYS: i64 = 36_500;

/// Caller-supplied fields of a new access key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessKey {
    pub name: String,
    pub bot_token: String,
    pub chat_id: String,
    pub duration_days: i64,
}

impl NewAccessKey {
    pub fn new(
        name: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        duration_days: i64,
    ) -> Self {
        Self {
            name: name.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            duration_days,
        }
    }
}

/// Validate a key creation request
///
/// Rules:
/// - name, bot token and chat ID must not be blank
/// - duration must be between 1 and 36500 days
pub fn validate_new_access_key(request: &NewAccessKey) -> Result<(), AccessKeyValidationError> {
    if request.name.trim().is_empty() {
        return Err(AccessKeyValidationError::EmptyName);
    }

    if request.bot_token.trim().is_empty() {
        return Err(AccessKeyValidationError::EmptyBotToken);
    }

    if request.chat_id.trim().is_empty() {
        return Err(AccessKeyValidationError::EmptyChatId);
    }

    if request.duration_days <= 0 {
        return Err(AccessKeyValidationError::NonPositiveDuration(
            request.duration_days,
        ));
    }

    if request.duration_days > MAX_DURATION_DAYS {
        return Err(AccessKeyValidationError::DurationTooLong(MAX_DURATION_DAYS));
    }

    Ok(())
}
