//! Telegram Bot API relay

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RelayConfig;
use crate::domain::{DomainError, MessageRelay, OutboundMessage, RelayError};

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramRelayConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for TelegramRelayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&RelayConfig> for TelegramRelayConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Relay that posts to `{api_url}/bot{token}/sendMessage`
#[derive(Debug, Clone)]
pub struct TelegramRelay {
    client: Client,
    api_url: String,
}

impl TelegramRelay {
    pub fn new(config: TelegramRelayConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn send_message_url(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, bot_token)
    }
}

#[async_trait]
impl MessageRelay for TelegramRelay {
    async fn send_message(
        &self,
        bot_token: &str,
        chat_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), RelayError> {
        let body = SendMessageRequest {
            chat_id,
            text: &message.text,
            parse_mode: message.parse_mode.as_deref(),
        };

        let response = self
            .client
            .post(self.send_message_url(bot_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the bot token, keep it out of the message
                RelayError::transport(e.without_url().to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::transport(e.without_url().to_string()))?;

        match serde_json::from_str::<TelegramResponse>(&text) {
            Ok(TelegramResponse { ok: true, .. }) => {
                debug!(chat_id = %chat_id, "Telegram accepted message");
                Ok(())
            }
            Ok(TelegramResponse { description, .. }) => Err(RelayError::rejected(
                description.unwrap_or_else(|| format!("HTTP {}", status)),
            )),
            Err(_) if status.is_success() => Ok(()),
            Err(_) => Err(RelayError::transport(format!(
                "Unexpected Telegram response: HTTP {}",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn relay_for(server: &MockServer) -> TelegramRelay {
        TelegramRelay::new(TelegramRelayConfig {
            api_url: format!("{}/", server.uri()),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_message_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "42",
                "text": "hello",
                "parse_mode": "Markdown"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": true, "result": {"message_id": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let message = OutboundMessage::plain("hello").with_parse_mode("Markdown");
        relay_for(&server)
            .send_message("123:abc", "42", &message)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_message_omits_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"chat_id": "7", "text": "bye"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        relay_for(&server)
            .send_message("t", "7", &OutboundMessage::plain("bye"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = relay_for(&server)
            .send_message("t", "1", &OutboundMessage::plain("x"))
            .await
            .unwrap_err();

        assert_eq!(err, RelayError::rejected("Bad Request: chat not found"));
        assert!(err.is_recipient_misconfigured());
    }

    #[tokio::test]
    async fn test_server_error_is_not_misconfiguration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = relay_for(&server)
            .send_message("t", "1", &OutboundMessage::plain("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Transport { .. }));
        assert!(!err.is_recipient_misconfigured());
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let relay = TelegramRelay::new(TelegramRelayConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();

        let err = relay
            .send_message("secret-token", "1", &OutboundMessage::plain("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Transport { .. }));
        assert!(!err.to_string().contains("secret-token"));
    }
}
