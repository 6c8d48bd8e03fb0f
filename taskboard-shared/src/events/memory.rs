//! In-process event bus for tests and single-binary runs
//!
//! Models the at-least-once contract of the Redis transport: fetched
//! deliveries stay in flight until acknowledged, and
//! [`InMemoryBus::redeliver_unacked`] puts them back on the queue the way a
//! restarted consumer re-reads its pending list.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{BoardDeleted, Delivery, EventPublisher, EventSubscription, PublishError, SubscribeError};

#[derive(Debug, Default)]
struct BusState {
    published: Vec<BoardDeleted>,
    queue: VecDeque<Delivery>,
    in_flight: BTreeMap<String, Delivery>,
    next_id: u64,
}

/// Single-topic, single-subscriber bus held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBus {
    state: Arc<Mutex<BusState>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, BusState>, String> {
        self.state.lock().map_err(|e| format!("bus lock poisoned: {}", e))
    }

    /// Makes every subsequent publish fail until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every event accepted so far, in publish order
    pub fn published(&self) -> Vec<BoardDeleted> {
        self.state().map(|s| s.published.clone()).unwrap_or_default()
    }

    /// Deliveries fetched but not yet acknowledged
    pub fn in_flight(&self) -> usize {
        self.state().map(|s| s.in_flight.len()).unwrap_or_default()
    }

    /// Puts unacknowledged deliveries back at the front of the queue
    pub fn redeliver_unacked(&self) {
        if let Ok(mut state) = self.state() {
            let pending = std::mem::take(&mut state.in_flight);
            for (_, delivery) in pending.into_iter().rev() {
                state.queue.push_front(delivery);
            }
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryBus {
    async fn publish(&self, event: &BoardDeleted) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Unavailable("in-memory bus set to fail".to_string()));
        }

        let mut state = self.state().map_err(PublishError::Unavailable)?;
        state.next_id += 1;
        let id = format!("{}-0", state.next_id);
        state.published.push(*event);
        state.queue.push_back(Delivery { id, event: *event });

        tracing::debug!(board_id = %event.board_id, "Queued BoardDeleted in memory");
        Ok(())
    }
}

#[async_trait]
impl EventSubscription for InMemoryBus {
    async fn fetch(&self, max: usize) -> Result<Vec<Delivery>, SubscribeError> {
        let mut state = self.state().map_err(SubscribeError::Unavailable)?;

        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(delivery) = state.queue.pop_front() else {
                break;
            };
            state.in_flight.insert(delivery.id.clone(), delivery.clone());
            batch.push(delivery);
        }

        Ok(batch)
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), SubscribeError> {
        let mut state = self.state().map_err(SubscribeError::Unavailable)?;
        state.in_flight.remove(delivery_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_then_fetch_and_ack() {
        let bus = InMemoryBus::new();
        let event = BoardDeleted::new(Uuid::new_v4());
        bus.publish(&event).await.unwrap();

        let batch = bus.fetch(10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].event, event);
        assert_eq!(bus.in_flight(), 1);

        bus.ack(&batch[0].id).await.unwrap();
        assert_eq!(bus.in_flight(), 0);
        assert!(bus.fetch(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unacked_delivery_is_redelivered() {
        let bus = InMemoryBus::new();
        let event = BoardDeleted::new(Uuid::new_v4());
        bus.publish(&event).await.unwrap();

        let first = bus.fetch(10).await.unwrap();
        bus.redeliver_unacked();
        let second = bus.fetch(10).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failing_bus_rejects_publish() {
        let bus = InMemoryBus::new();
        bus.set_failing(true);

        let result = bus.publish(&BoardDeleted::new(Uuid::new_v4())).await;
        assert!(matches!(result, Err(PublishError::Unavailable(_))));
        assert!(bus.published().is_empty());

        bus.set_failing(false);
        assert!(bus.publish(&BoardDeleted::new(Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_respects_max() {
        let bus = InMemoryBus::new();
        for _ in 0..3 {
            bus.publish(&BoardDeleted::new(Uuid::new_v4())).await.unwrap();
        }

        assert_eq!(bus.fetch(2).await.unwrap().len(), 2);
        assert_eq!(bus.fetch(2).await.unwrap().len(), 1);
    }
}
