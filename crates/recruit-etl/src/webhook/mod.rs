//! Submission-side trigger of the export endpoint

pub mod config;
pub mod redrive;
pub mod trigger;

pub use config::{resolve_webhook_url, WebhookTriggerConfig};
pub use redrive::redrive_failed_triggers;
pub use trigger::{
    TriggerOutcome, TriggerResult, WebhookPayload, WebhookTriggerService, WEBHOOK_TOKEN_HEADER,
};
