//! Retry-policy seam for best-effort deliveries
//!
//! The trigger and the export service hand every failed delivery to a
//! [`RetryPolicy`]. The default, [`NoRetry`], drops it after logging, which
//! keeps the fire-and-forget behaviour. A durable queue can be plugged in
//! behind the same trait; [`ChannelRetryPolicy`] forwards failures to an
//! in-process channel for a re-drive loop.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::webhook::TriggerOutcome;

/// A delivery that did not complete
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailedDelivery {
    /// The webhook call did not reach the export endpoint
    Trigger {
        application_id: String,
        last_watermark: Option<String>,
        outcome: TriggerOutcome,
        error: Option<String>,
    },
    /// The export aborted before all structured records were written
    Export { application_id: String, error: String },
}

impl FailedDelivery {
    pub fn application_id(&self) -> &str {
        match self {
            FailedDelivery::Trigger { application_id, .. } | FailedDelivery::Export { application_id, .. } => {
                application_id
            },
        }
    }
}

#[async_trait]
pub trait RetryPolicy: Send + Sync {
    /// Called once per failed delivery. Must not fail the caller.
    async fn on_failure(&self, failure: FailedDelivery);
}

/// Drop failures after logging them
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

#[async_trait]
impl RetryPolicy for NoRetry {
    async fn on_failure(&self, failure: FailedDelivery) {
        debug!(
            application_id = %failure.application_id(),
            ?failure,
            "Delivery failed, no retry policy configured"
        );
    }
}

/// Forward failures to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelRetryPolicy {
    sender: mpsc::UnboundedSender<FailedDelivery>,
}

impl ChannelRetryPolicy {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FailedDelivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RetryPolicy for ChannelRetryPolicy {
    async fn on_failure(&self, failure: FailedDelivery) {
        let application_id = failure.application_id().to_string();
        if self.sender.send(failure).is_err() {
            warn!(%application_id, "Retry channel closed, dropping failed delivery");
        }
    }
}

/// Exponential backoff between re-drive attempts
#[derive(Debug, Clone, Copy)]
pub struct BackoffSchedule {
    backoff_coefficient: u32,
    initial_interval: Duration,
    maximum_interval: Option<Duration>,
}

impl BackoffSchedule {
    pub fn new(backoff_coefficient: u32, initial_interval: Duration, maximum_interval: Option<Duration>) -> Self {
        Self {
            backoff_coefficient,
            initial_interval,
            maximum_interval,
        }
    }

    /// Delay before the given zero-based attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_coefficient.saturating_pow(attempt);
        let candidate = self.initial_interval.saturating_mul(factor);

        match self.maximum_interval {
            Some(max) => candidate.min(max),
            None => candidate,
        }
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            backoff_coefficient: 2,
            initial_interval: Duration::from_secs(1),
            maximum_interval: Some(Duration::from_secs(60)),
        }
    }
}
