//! # Channel Error Types

use thiserror::Error;

/// Outbound delivery failures
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Push request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Channel is not configured: {message}")]
    NotConfigured { message: String },
}

impl DeliveryError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// HTTP status code carried by a non-success response, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => DeliveryError::status(status.as_u16(), err.to_string()),
            None => DeliveryError::transport(err.to_string()),
        }
    }
}

/// Inbound webhook failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing signature header")]
    MissingSignature,

    #[error("Signature is not valid base64")]
    MalformedSignature,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}
