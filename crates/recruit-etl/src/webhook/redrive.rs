use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::trigger::{WebhookPayload, WebhookTriggerService};
use crate::retry::{BackoffSchedule, FailedDelivery};

/// Re-deliver failed triggers received from a [`ChannelRetryPolicy`].
///
/// Each failure is retried up to `max_attempts` times, sleeping according to
/// `schedule` before every attempt. Export failures are ignored; they need the
/// endpoint's own caller to act. The task ends when every sender is dropped.
///
/// [`ChannelRetryPolicy`]: crate::retry::ChannelRetryPolicy
pub fn redrive_failed_triggers(
    service: WebhookTriggerService,
    mut failures: UnboundedReceiver<FailedDelivery>,
    schedule: BackoffSchedule,
    max_attempts: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(failure) = failures.recv().await {
            let payload = match failure {
                FailedDelivery::Trigger {
                    application_id,
                    last_watermark,
                    ..
                } => WebhookPayload {
                    application_id,
                    last_watermark,
                },
                other => {
                    debug!(application_id = %other.application_id(), "Skipping non-trigger failure");
                    continue;
                },
            };
            redrive_one(&service, &payload, &schedule, max_attempts).await;
        }
    })
}

async fn redrive_one(
    service: &WebhookTriggerService,
    payload: &WebhookPayload,
    schedule: &BackoffSchedule,
    max_attempts: u32,
) {
    for attempt in 0..max_attempts {
        tokio::time::sleep(schedule.delay_for_attempt(attempt)).await;

        let result = service.deliver(payload).await;
        if result.triggered {
            info!(
                application_id = %payload.application_id,
                attempt = attempt + 1,
                "Re-delivered ETL trigger"
            );
            return;
        }
    }

    warn!(
        application_id = %payload.application_id,
        max_attempts,
        "Giving up on ETL trigger"
    );
}
