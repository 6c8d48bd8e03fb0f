/// Redis Streams transport for board events
///
/// ```text
/// ┌───────────────┐                          ┌────────────────────────────┐
/// │ API / relay   │ ──XADD──> events:board-  │ group delete-tasks-on-     │
/// └───────────────┘           deleted ─────> │ board-deletion (worker)    │
///                                            └────────────────────────────┘
///                                               XREADGROUP / XACK
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::redis::{RedisClient, RedisConfig, RedisEventPublisher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let publisher = RedisEventPublisher::new(client);
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod publisher;
pub mod subscription;

pub use client::{RedisClient, RedisClientError, RedisConfig};
pub use publisher::{PublisherConfig, RedisEventPublisher};
pub use subscription::RedisSubscription;
