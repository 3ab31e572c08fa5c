//! Messaging relay contract
//!
//! The relay delivers a text message to a chat through the bot identity
//! owned by an access key.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Errors reported by a messaging relay
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    /// The relay answered but refused the message
    #[error("Relay rejected message: {description}")]
    Rejected { description: String },

    #[error("Relay transport error: {message}")]
    Transport { message: String },
}

impl RelayError {
    pub fn rejected(description: impl Into<String>) -> Self {
        Self::Rejected {
            description: description.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// The rejection points at the key owner's bot token or chat ID
    pub fn is_recipient_misconfigured(&self) -> bool {
        match self {
            Self::Rejected { description } => {
                let description = description.to_lowercase();
                description.contains("chat not found") || description.contains("bot token")
            }
            Self::Transport { .. } => false,
        }
    }
}

/// A message to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub parse_mode: Option<String>,
}

impl OutboundMessage {
    /// Plain text, no markup
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: impl Into<String>) -> Self {
        self.parse_mode = Some(parse_mode.into());
        self
    }
}

/// Outbound messaging relay
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageRelay: Send + Sync {
    /// Deliver `message` to `chat_id` via the bot identified by `bot_token`
    async fn send_message(
        &self,
        bot_token: &str,
        chat_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), RelayError>;
}
