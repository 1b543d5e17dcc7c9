//! # System Constants
//!
//! Defaults and fixed values shared across the reminder service.

/// Queue name used for durable reminder jobs when none is configured
pub const DEFAULT_QUEUE_NAME: &str = "task_reminders";

/// Minutes added to "now" for tasks submitted without a due time
pub const DEFAULT_REMINDER_OFFSET_MINUTES: i64 = 60;

/// Upper bound for the default offset (one leap year)
pub const MAX_REMINDER_OFFSET_MINUTES: i64 = 366 * 24 * 60;

/// Persona phrase appended to every outbound reminder
pub const DEFAULT_CLOSING_PHRASE: &str = "You've got this!";

/// Delivery channel tag stored on tasks created from the webhook
pub const DEFAULT_CHANNEL: &str = "line";

/// Messaging platform API defaults
pub mod channel {
    pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";
    pub const PUSH_PATH: &str = "/v2/bot/message/push";
    pub const REPLY_PATH: &str = "/v2/bot/message/reply";
    pub const SIGNATURE_HEADER: &str = "x-line-signature";
    pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
}

/// Durable queue worker defaults
pub mod queue {
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
    /// Seconds a consumed job stays invisible while the worker delivers it
    pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: i32 = 30;
    pub const DEFAULT_BATCH_SIZE: i32 = 10;
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;
    pub const MAX_QUEUE_NAME_LENGTH: usize = 47;
}

/// Format used for the due-time suffix of rendered reminders
pub const DUE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Environment variable names consulted during configuration loading
pub mod env {
    pub const ENVIRONMENT: &str = "REMINDER_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const CONFIG_DIR: &str = "REMINDER_CONFIG_DIR";
    pub const PREFIX: &str = "REMINDER";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
    pub const CHANNEL_ACCESS_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
}
