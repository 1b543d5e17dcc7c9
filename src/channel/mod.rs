//! # Messaging Channel Integration
//!
//! Inbound webhook handling (signature checks, event normalization) and the
//! outbound client used to push reminders and reply to users.

pub mod acknowledgement;
pub mod errors;
pub mod events;
pub mod push_client;
pub mod signature;

pub use acknowledgement::{Acknowledger, CompletionAcknowledger, TemplateAcknowledger};
pub use errors::{DeliveryError, WebhookError};
pub use events::{TaskCreationRequest, WebhookEvent, WebhookPayload};
pub use push_client::PushClient;
pub use signature::{sign_body, verify_signature};
