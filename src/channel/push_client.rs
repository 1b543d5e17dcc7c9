//! # Outbound Channel Client
//!
//! Authenticated calls to the messaging platform's push and reply endpoints.

use crate::channel::DeliveryError;
use crate::config::ChannelConfig;
use crate::constants::channel::{PUSH_PATH, REPLY_PATH};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct TextMessage<'a> {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub text: &'a str,
}

impl<'a> TextMessage<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            message_type: "text",
            text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub to: &'a str,
    pub messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<TextMessage<'a>>,
}

/// reqwest-based client for the platform's messaging API
#[derive(Debug, Clone)]
pub struct PushClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl PushClient {
    pub fn new(config: &ChannelConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn push_url(&self) -> String {
        format!("{}{}", self.base_url, PUSH_PATH)
    }

    pub fn reply_url(&self) -> String {
        format!("{}{}", self.base_url, REPLY_PATH)
    }

    /// Push a single text message to a user
    #[instrument(skip(self, text), fields(user_id = %user_id))]
    pub async fn push_text(&self, user_id: &str, text: &str) -> Result<(), DeliveryError> {
        let body = PushRequest {
            to: user_id,
            messages: vec![TextMessage::new(text)],
        };
        self.post(&self.push_url(), &body).await
    }

    /// Answer an inbound event using its reply token
    #[instrument(skip(self, reply_token, text))]
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![TextMessage::new(text)],
        };
        self.post(&self.reply_url(), &body).await
    }

    async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<(), DeliveryError> {
        if self.access_token.is_empty() {
            return Err(DeliveryError::NotConfigured {
                message: "channel access token is empty".to_string(),
            });
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DeliveryError::status(status.as_u16(), text));
        }

        debug!(status = status.as_u16(), "📬 Channel API call succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_request_shape() {
        let body = PushRequest {
            to: "U1",
            messages: vec![TextMessage::new("hello")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "to": "U1", "messages": [{ "type": "text", "text": "hello" }] })
        );
    }

    #[test]
    fn test_reply_request_uses_camel_case_token() {
        let body = ReplyRequest {
            reply_token: "tok",
            messages: vec![TextMessage::new("ok")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["replyToken"], "tok");
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let config = ChannelConfig {
            api_base_url: "http://localhost:9999/".to_string(),
            ..ChannelConfig::default()
        };
        let client = PushClient::new(&config).unwrap();
        assert_eq!(client.push_url(), "http://localhost:9999/v2/bot/message/push");
        assert_eq!(client.reply_url(), "http://localhost:9999/v2/bot/message/reply");
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let client = PushClient::new(&ChannelConfig::default()).unwrap();
        let err = client.push_text("U1", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured { .. }));
    }
}
