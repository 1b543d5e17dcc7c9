//! # Web API Application State
//!
//! Shared handles used by every request handler.

use crate::channel::{Acknowledger, PushClient};
use crate::database::TaskStore;
use crate::scheduler::ReminderScheduler;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub scheduler: Arc<ReminderScheduler>,
    pub store: Arc<dyn TaskStore>,
    pub push_client: PushClient,
    pub acknowledger: Arc<dyn Acknowledger>,
    pub channel_secret: Arc<str>,
    pub default_offset_minutes: i64,
    pub environment: String,
}
