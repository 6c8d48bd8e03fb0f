/// Board deletion events
///
/// When a board is deleted, the board service publishes [`BoardDeleted`]
/// on the `board-deleted` topic. The task service consumes it as subscriber
/// `delete-tasks-on-board-deletion` and removes the board's tasks.
///
/// Delivery is at least once. Consumers must treat a repeated event as
/// success.
///
/// # Transports
///
/// - [`crate::redis`]: Redis Streams with a consumer group (production)
/// - [`memory::InMemoryBus`]: in-process queue with redelivery (tests)
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::events::{BoardDeleted, EventPublisher};
/// use taskboard_shared::events::memory::InMemoryBus;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryBus::new();
/// bus.publish(&BoardDeleted::new(Uuid::new_v4())).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod memory;
pub mod serialization;

pub use serialization::{deserialize_event, serialize_event, SerializationError};

/// Topic carrying board deletions
pub const BOARD_DELETED_TOPIC: &str = "board-deleted";

/// Subscriber that cascades board deletions into the task store
pub const CASCADE_SUBSCRIBER: &str = "delete-tasks-on-board-deletion";

/// A board was deleted; its tasks must go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardDeleted {
    pub board_id: Uuid,
}

impl BoardDeleted {
    pub fn new(board_id: Uuid) -> Self {
        Self { board_id }
    }
}

/// One delivery of an event to a subscriber
///
/// `id` is the transport's delivery handle and is passed back to
/// [`EventSubscription::ack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub event: BoardDeleted,
}

/// Failure to hand an event to the transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Unavailable(String),

    #[error("failed to publish after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Failure to read or acknowledge deliveries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    #[error("event transport unavailable: {0}")]
    Unavailable(String),
}

/// Publishing side of the topic
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BoardDeleted) -> Result<(), PublishError>;
}

/// Subscribing side of the topic, bound to one named subscriber
///
/// Deliveries that are fetched but never acknowledged are handed out again.
#[async_trait]
pub trait EventSubscription: Send + Sync {
    /// Fetches up to `max` deliveries, waiting briefly if none are ready
    async fn fetch(&self, max: usize) -> Result<Vec<Delivery>, SubscribeError>;

    /// Confirms a delivery was handled
    async fn ack(&self, delivery_id: &str) -> Result<(), SubscribeError>;
}
