//! Board deletion cascade
//!
//! Publisher side: [`CascadeNotifier`] pushes `BoardDeleted` for an outbox
//! entry and marks the entry published. Entries it cannot publish stay in
//! the outbox for the worker's relay.
//!
//! Subscriber side: [`BoardDeletedHandler`] deletes every task of the board.
//! Deleting an already-empty set counts as success, so redelivery is safe.

use std::sync::Arc;

use crate::error::ServiceResult;
use crate::events::{BoardDeleted, EventPublisher};
use crate::models::OutboxEntry;
use crate::store::{OutboxStore, TaskStore};

/// Outcome of one relay pass over the outbox
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayPass {
    pub claimed: usize,
    pub published: usize,
}

impl RelayPass {
    pub fn failed(&self) -> usize {
        self.claimed - self.published
    }
}

#[derive(Clone)]
pub struct CascadeNotifier {
    publisher: Arc<dyn EventPublisher>,
    outbox: Arc<dyn OutboxStore>,
}

impl CascadeNotifier {
    pub fn new(publisher: Arc<dyn EventPublisher>, outbox: Arc<dyn OutboxStore>) -> Self {
        Self { publisher, outbox }
    }

    /// Publishes the event for `entry` and settles the outbox row
    ///
    /// On a publish failure the failure is recorded on the row (releasing
    /// its lease) and the publish error is returned.
    pub async fn deliver(&self, entry: &OutboxEntry) -> ServiceResult<()> {
        let event = BoardDeleted::new(entry.board_id);

        match self.publisher.publish(&event).await {
            Ok(()) => {
                self.outbox.mark_published(entry.id).await?;
                tracing::info!(board_id = %entry.board_id, outbox_id = entry.id, "BoardDeleted published");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    board_id = %entry.board_id,
                    outbox_id = entry.id,
                    attempts = entry.attempts,
                    error = %err,
                    "BoardDeleted publish failed"
                );
                self.outbox.record_failure(entry.id, &err.to_string()).await?;
                Err(err.into())
            }
        }
    }

    /// Leases up to `limit` unpublished entries and tries each once
    pub async fn relay_pending(&self, limit: i64, lease_secs: i64) -> ServiceResult<RelayPass> {
        let entries = self.outbox.claim_unpublished(limit, lease_secs).await?;
        let mut published = 0;

        for entry in &entries {
            if self.deliver(entry).await.is_ok() {
                published += 1;
            }
        }

        let pass = RelayPass {
            claimed: entries.len(),
            published,
        };
        if pass.claimed > 0 {
            tracing::info!(claimed = pass.claimed, published, "Outbox relay pass finished");
        }
        Ok(pass)
    }
}

/// Task-side consumer of `BoardDeleted`
#[derive(Clone)]
pub struct BoardDeletedHandler {
    tasks: Arc<dyn TaskStore>,
}

impl BoardDeletedHandler {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// Deletes the board's tasks, returning how many were removed
    pub async fn handle(&self, event: &BoardDeleted) -> ServiceResult<u64> {
        let removed = self.tasks.delete_board_tasks(event.board_id).await?;
        tracing::info!(board_id = %event.board_id, removed, "Cascade deleted board tasks");
        Ok(removed)
    }
}
