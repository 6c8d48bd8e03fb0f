/// Outbox relay
///
/// Publishes `BoardDeleted` for outbox entries the API could not publish
/// inline. Each pass leases a batch, tries every entry once and settles it.
/// Passes with failures back off exponentially; a clean pass resets the
/// delay to the poll interval.
///
/// ```text
/// board_deleted_outbox ──claim──> OutboxRelay ──publish──> events:board-deleted
///          ▲                          │
///          └──── mark_published / record_failure
/// ```

use std::time::Duration;

use taskboard_shared::error::ServiceResult;
use taskboard_shared::services::{CascadeNotifier, RelayPass};
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub poll_interval: Duration,
    pub max_backoff: Duration,
    pub batch_size: i64,
    pub lease_secs: i64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            batch_size: 50,
            lease_secs: 30,
        }
    }
}

pub struct OutboxRelay {
    notifier: CascadeNotifier,
    config: RelayConfig,
}

impl OutboxRelay {
    pub fn new(notifier: CascadeNotifier, config: RelayConfig) -> Self {
        Self { notifier, config }
    }

    /// One pass over the outbox
    pub async fn run_once(&self) -> ServiceResult<RelayPass> {
        self.notifier
            .relay_pending(self.config.batch_size, self.config.lease_secs)
            .await
    }

    /// Runs passes until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            batch_size = self.config.batch_size,
            lease_secs = self.config.lease_secs,
            "Outbox relay starting"
        );
        let mut backoff = Backoff::new(self.config.poll_interval, self.config.max_backoff);

        loop {
            let full_batch = match self.run_once().await {
                Ok(pass) if pass.failed() > 0 => {
                    backoff.fail();
                    tracing::warn!(
                        failed = pass.failed(),
                        retry_in_ms = backoff.delay().as_millis() as u64,
                        "Outbox entries left unpublished"
                    );
                    false
                }
                Ok(pass) => {
                    backoff.reset();
                    pass.claimed as i64 >= self.config.batch_size
                }
                Err(e) => {
                    backoff.fail();
                    tracing::error!(error = %e, retry_in_ms = backoff.delay().as_millis() as u64, "Outbox relay pass failed");
                    false
                }
            };

            // A full clean batch means more may be waiting
            if full_batch {
                if shutdown.is_cancelled() {
                    break;
                }
                continue;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff.delay()) => {}
            }
        }

        tracing::info!("Outbox relay stopped");
    }
}
