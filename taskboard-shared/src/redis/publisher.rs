/// Publishes board events to a Redis Stream
///
/// ```text
/// API / outbox relay
///     │ publish(BoardDeleted)
///     ▼
/// RedisEventPublisher ──XADD──> events:board-deleted ──> consumer groups
/// ```
///
/// XADD is retried with exponential backoff. Each attempt is bounded by the
/// client's command timeout.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::events::serialization::{board_deleted_stream_key, serialize_event};
use crate::events::{BoardDeleted, EventPublisher, PublishError};
use crate::redis::client::RedisClient;

/// Retry behaviour for XADD
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further retry
    pub base_retry_delay_ms: u64,

    /// Upper bound on the delay between retries
    pub max_retry_delay_ms: u64,

    /// Approximate stream length cap (`MAXLEN ~`)
    pub max_stream_len: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
            max_stream_len: 100_000,
        }
    }
}

impl PublisherConfig {
    /// Backoff before retry number `attempt` (1-based)
    pub fn retry_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.base_retry_delay_ms
            .saturating_mul(factor)
            .min(self.max_retry_delay_ms)
    }
}

/// [`EventPublisher`] backed by Redis Streams
#[derive(Clone)]
pub struct RedisEventPublisher {
    client: RedisClient,
    config: PublisherConfig,
}

impl RedisEventPublisher {
    pub fn new(client: RedisClient) -> Self {
        let config = PublisherConfig {
            max_retries: client.config().max_retries,
            ..Default::default()
        };
        Self { client, config }
    }

    pub fn with_config(client: RedisClient, config: PublisherConfig) -> Self {
        Self { client, config }
    }

    async fn xadd_with_retry(
        &self,
        stream_key: &str,
        fields: &HashMap<String, String>,
    ) -> Result<String, PublishError> {
        let items: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let maxlen = redis::streams::StreamMaxlen::Approx(self.config.max_stream_len);

        let mut attempt = 0;
        loop {
            let mut conn = self.client.get_connection();
            let result = tokio::time::timeout(
                self.client.command_timeout(),
                conn.xadd_maxlen::<_, _, _, _, String>(stream_key, maxlen, "*", items.as_slice()),
            )
            .await;

            let last_error = match result {
                Ok(Ok(stream_id)) => return Ok(stream_id),
                Ok(Err(e)) => e.to_string(),
                Err(_) => "XADD timed out".to_string(),
            };

            attempt += 1;
            if attempt > self.config.max_retries {
                return Err(PublishError::Exhausted {
                    attempts: attempt,
                    last_error,
                });
            }

            let delay_ms = self.config.retry_delay_ms(attempt);
            tracing::warn!(
                stream_key = %stream_key,
                attempt = attempt,
                delay_ms = delay_ms,
                error = %last_error,
                "XADD failed, retrying"
            );
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: &BoardDeleted) -> Result<(), PublishError> {
        let stream_key = board_deleted_stream_key();
        let stream_id = self
            .xadd_with_retry(&stream_key, &serialize_event(event))
            .await?;

        tracing::info!(
            board_id = %event.board_id,
            stream_id = %stream_id,
            "Published BoardDeleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = PublisherConfig::default();
        assert_eq!(config.retry_delay_ms(1), 100);
        assert_eq!(config.retry_delay_ms(2), 200);
        assert_eq!(config.retry_delay_ms(3), 400);
        assert_eq!(config.retry_delay_ms(20), 5000);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_publish_board_deleted() {
        use crate::redis::client::RedisConfig;
        use uuid::Uuid;

        let client = RedisClient::new(RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        let publisher = RedisEventPublisher::new(client);

        publisher
            .publish(&BoardDeleted::new(Uuid::new_v4()))
            .await
            .unwrap();
    }
}
