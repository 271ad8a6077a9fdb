//! Waits for a scan task to reach a verdict.

use crate::common::{PollingFailure, ScanError};
use crate::provider::ScanProvider;
use crate::scan::model::{ScanOutcome, ScanPoll, TaskId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

#[async_trait::async_trait]
pub trait ScanPoller: Send + Sync {
    /// Resolve once the task has a verdict, or fail.
    async fn wait_for_outcome(&self, task_id: &TaskId) -> Result<ScanOutcome, ScanError>;
}

/// Polls a provider on a fixed interval until a verdict or the deadline.
pub struct ProviderPoller {
    provider: Arc<dyn ScanProvider>,
    interval: Duration,
    timeout: Duration,
}

/// `tokio::time::interval` panics on a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl ProviderPoller {
    /// A zero `interval` is raised to one millisecond.
    pub fn new(provider: Arc<dyn ScanProvider>, interval: Duration, timeout: Duration) -> Self {
        Self {
            provider,
            interval: interval.max(MIN_INTERVAL),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ScanPoller for ProviderPoller {
    #[tracing::instrument(skip_all, fields(task_id = %task_id))]
    async fn wait_for_outcome(&self, task_id: &TaskId) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        let deadline = started + self.timeout;

        // First tick fires immediately so a finished scan is seen without delay
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let timed_out = |attempts: u32| -> ScanError {
            tracing::debug!(attempts, "Gave up waiting for verdict");
            PollingFailure::TimedOut {
                task_id: task_id.to_string(),
                waited: started.elapsed(),
            }
            .into()
        };

        let mut attempts = 0u32;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::time::sleep_until(deadline) => return Err(timed_out(attempts)),
            }

            attempts += 1;
            let poll = tokio::time::timeout_at(deadline, self.provider.fetch_result(task_id))
                .await
                .map_err(|_| timed_out(attempts))??;

            match poll {
                ScanPoll::Completed(outcome) => {
                    tracing::debug!(attempts, score = outcome.fraud_score, "Verdict received");
                    return Ok(*outcome);
                }
                ScanPoll::Failed => {
                    return Err(PollingFailure::ScanFailed {
                        task_id: task_id.to_string(),
                    }
                    .into());
                }
                ScanPoll::InProgress(status) => {
                    tracing::trace!(attempts, ?status, "Scan still running");
                }
            }
        }
    }
}
