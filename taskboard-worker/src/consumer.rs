/// Cascade consumer
///
/// Task-service side of the `BoardDeleted` topic. Every delivery is handed to
/// [`BoardDeletedHandler`] and acknowledged only after the handler succeeds,
/// so a failed or interrupted cascade is delivered again. The handler is
/// idempotent, which makes redelivery safe.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use taskboard_shared::events::memory::InMemoryBus;
/// use taskboard_shared::services::BoardDeletedHandler;
/// use taskboard_shared::store::InMemoryTaskStore;
/// use taskboard_worker::consumer::CascadeConsumer;
///
/// # async fn example() {
/// let consumer = CascadeConsumer::new(
///     Arc::new(InMemoryBus::new()),
///     BoardDeletedHandler::new(Arc::new(InMemoryTaskStore::new())),
///     50,
/// );
/// let pass = consumer.process_batch().await;
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use taskboard_shared::events::{EventSubscription, SubscribeError};
use taskboard_shared::services::BoardDeletedHandler;
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;

/// Outcome of one fetch-handle-ack round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerPass {
    pub fetched: usize,
    pub acked: usize,
}

pub struct CascadeConsumer {
    subscription: Arc<dyn EventSubscription>,
    handler: BoardDeletedHandler,
    batch_size: usize,
}

impl CascadeConsumer {
    pub fn new(
        subscription: Arc<dyn EventSubscription>,
        handler: BoardDeletedHandler,
        batch_size: usize,
    ) -> Self {
        Self {
            subscription,
            handler,
            batch_size,
        }
    }

    /// Fetches one batch and handles each delivery
    ///
    /// # Errors
    ///
    /// Returns an error only if the fetch itself fails. Handler and ack
    /// failures leave the delivery unacknowledged and are logged.
    pub async fn process_batch(&self) -> Result<ConsumerPass, SubscribeError> {
        let deliveries = self.subscription.fetch(self.batch_size).await?;
        let mut pass = ConsumerPass {
            fetched: deliveries.len(),
            acked: 0,
        };

        for delivery in deliveries {
            let board_id = delivery.event.board_id;

            if let Err(e) = self.handler.handle(&delivery.event).await {
                tracing::warn!(
                    board_id = %board_id,
                    delivery_id = %delivery.id,
                    error = %e,
                    "Cascade failed, leaving delivery for redelivery"
                );
                continue;
            }

            match self.subscription.ack(&delivery.id).await {
                Ok(()) => pass.acked += 1,
                Err(e) => tracing::warn!(
                    board_id = %board_id,
                    delivery_id = %delivery.id,
                    error = %e,
                    "Ack failed; the delivery will be handled again"
                ),
            }
        }

        Ok(pass)
    }

    /// Consumes until `shutdown` is cancelled
    ///
    /// `idle` is the pause after an empty fetch. Transports that block inside
    /// `fetch` can pass a short value.
    pub async fn run(&self, shutdown: CancellationToken, idle: Duration, max_backoff: Duration) {
        tracing::info!(batch_size = self.batch_size, "Cascade consumer starting");
        let mut backoff = Backoff::new(idle, max_backoff);

        loop {
            let pass = tokio::select! {
                _ = shutdown.cancelled() => break,
                pass = self.process_batch() => pass,
            };

            let pause = match pass {
                Ok(pass) if pass.acked < pass.fetched => {
                    backoff.fail();
                    Some(backoff.delay())
                }
                Ok(pass) => {
                    backoff.reset();
                    (pass.fetched == 0).then_some(idle)
                }
                Err(e) => {
                    backoff.fail();
                    tracing::error!(error = %e, retry_in_ms = backoff.delay().as_millis() as u64, "Fetching deliveries failed");
                    Some(backoff.delay())
                }
            };

            if let Some(pause) = pause {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        tracing::info!("Cascade consumer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use taskboard_shared::events::memory::InMemoryBus;
    use taskboard_shared::events::{BoardDeleted, Delivery, EventPublisher};
    use taskboard_shared::models::{CreateTask, TaskStage};
    use taskboard_shared::store::{InMemoryTaskStore, TaskStore};
    use uuid::Uuid;

    async fn seed(store: &InMemoryTaskStore, board_id: Uuid, n: usize) {
        for i in 0..n {
            store
                .insert_task(CreateTask {
                    board_id,
                    title: format!("task {}", i),
                    description: String::new(),
                    created_by: Uuid::new_v4(),
                    assignee_id: None,
                    stage: TaskStage::ToDo,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_batch_is_handled_and_acked() {
        let bus = InMemoryBus::new();
        let tasks = InMemoryTaskStore::new();
        let board_id = Uuid::new_v4();
        seed(&tasks, board_id, 3).await;
        bus.publish(&BoardDeleted::new(board_id)).await.unwrap();

        let consumer = CascadeConsumer::new(
            Arc::new(bus.clone()),
            BoardDeletedHandler::new(Arc::new(tasks.clone())),
            10,
        );

        assert_eq!(
            consumer.process_batch().await.unwrap(),
            ConsumerPass { fetched: 1, acked: 1 }
        );
        assert_eq!(tasks.count_for_board(board_id), 0);
        assert_eq!(bus.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_deliveries_converge() {
        let bus = InMemoryBus::new();
        let tasks = InMemoryTaskStore::new();
        let board_id = Uuid::new_v4();
        seed(&tasks, board_id, 2).await;
        let event = BoardDeleted::new(board_id);
        bus.publish(&event).await.unwrap();
        bus.publish(&event).await.unwrap();

        let consumer = CascadeConsumer::new(
            Arc::new(bus.clone()),
            BoardDeletedHandler::new(Arc::new(tasks.clone())),
            10,
        );

        let pass = consumer.process_batch().await.unwrap();
        assert_eq!(pass, ConsumerPass { fetched: 2, acked: 2 });
        assert_eq!(tasks.count_for_board(board_id), 0);
    }

    /// Subscription whose acks always fail
    struct AckFails(InMemoryBus);

    #[async_trait]
    impl EventSubscription for AckFails {
        async fn fetch(&self, max: usize) -> Result<Vec<Delivery>, SubscribeError> {
            self.0.fetch(max).await
        }

        async fn ack(&self, _delivery_id: &str) -> Result<(), SubscribeError> {
            Err(SubscribeError::Unavailable("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_unacked_delivery_is_redelivered() {
        let bus = InMemoryBus::new();
        let tasks = InMemoryTaskStore::new();
        let board_id = Uuid::new_v4();
        seed(&tasks, board_id, 1).await;
        bus.publish(&BoardDeleted::new(board_id)).await.unwrap();

        let flaky = CascadeConsumer::new(
            Arc::new(AckFails(bus.clone())),
            BoardDeletedHandler::new(Arc::new(tasks.clone())),
            10,
        );
        assert_eq!(
            flaky.process_batch().await.unwrap(),
            ConsumerPass { fetched: 1, acked: 0 }
        );
        assert_eq!(bus.in_flight(), 1);

        // A late task lands after the first cascade ran
        seed(&tasks, board_id, 1).await;
        bus.redeliver_unacked();

        let consumer = CascadeConsumer::new(
            Arc::new(bus.clone()),
            BoardDeletedHandler::new(Arc::new(tasks.clone())),
            10,
        );
        assert_eq!(
            consumer.process_batch().await.unwrap(),
            ConsumerPass { fetched: 1, acked: 1 }
        );
        assert_eq!(tasks.count_for_board(board_id), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let bus = InMemoryBus::new();
        let tasks = InMemoryTaskStore::new();
        let board_id = Uuid::new_v4();
        seed(&tasks, board_id, 2).await;

        let consumer = Arc::new(CascadeConsumer::new(
            Arc::new(bus.clone()),
            BoardDeletedHandler::new(Arc::new(tasks.clone())),
            10,
        ));
        let shutdown = CancellationToken::new();
        let handle = {
            let consumer = consumer.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                consumer
                    .run(shutdown, Duration::from_millis(5), Duration::from_millis(50))
                    .await
            })
        };

        bus.publish(&BoardDeleted::new(board_id)).await.unwrap();
        for _ in 0..100 {
            if tasks.count_for_board(board_id) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(tasks.count_for_board(board_id), 0);
    }
}
