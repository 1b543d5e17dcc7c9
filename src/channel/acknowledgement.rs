//! # Acknowledgement Replies
//!
//! Text for the immediate chat reply sent when a task is accepted. The
//! completion-backed variant asks an OpenAI-compatible endpoint for a short
//! friendly line and falls back to the template on any failure. Nothing here
//! affects scheduling.

use crate::config::AcknowledgementConfig;
use crate::constants::DUE_TIME_FORMAT;
use crate::models::ReminderRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[async_trait]
pub trait Acknowledger: Send + Sync + std::fmt::Debug {
    async fn acknowledge(&self, request: &ReminderRequest) -> String;
}

/// Deterministic acknowledgement built from the request
#[derive(Debug, Clone)]
pub struct TemplateAcknowledger {
    closing_phrase: String,
}

impl TemplateAcknowledger {
    pub fn new(closing_phrase: impl Into<String>) -> Self {
        Self {
            closing_phrase: closing_phrase.into(),
        }
    }

    pub fn render(&self, request: &ReminderRequest) -> String {
        format!(
            "Got it! I'll remind you about \"{}\" at {}. {}",
            request.task.title,
            request.reminder_time.format(DUE_TIME_FORMAT),
            self.closing_phrase
        )
    }
}

#[async_trait]
impl Acknowledger for TemplateAcknowledger {
    async fn acknowledge(&self, request: &ReminderRequest) -> String {
        self.render(request)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Acknowledgement generated by a chat-completion endpoint
#[derive(Debug, Clone)]
pub struct CompletionAcknowledger {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    fallback: TemplateAcknowledger,
}

impl CompletionAcknowledger {
    pub fn new(config: &AcknowledgementConfig, closing_phrase: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", config.api_base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            fallback: TemplateAcknowledger::new(closing_phrase),
        })
    }

    async fn complete(&self, request: &ReminderRequest) -> Result<String, reqwest::Error> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You confirm reminders in one short, warm sentence.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Confirm a reminder for \"{}\" at {}.",
                        request.task.title,
                        request.reminder_time.format(DUE_TIME_FORMAT)
                    ),
                },
            ],
            max_tokens: 80,
        };

        let response: ChatCompletionResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Acknowledger for CompletionAcknowledger {
    async fn acknowledge(&self, request: &ReminderRequest) -> String {
        match self.complete(request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => self.fallback.render(request),
            Err(e) => {
                warn!(task_id = %request.task_id(), error = %e, "Acknowledgement completion failed, using template");
                self.fallback.render(request)
            }
        }
    }
}
