/// Consumer-group subscription on the board event stream
///
/// Each named subscriber maps to a Redis consumer group on
/// `events:board-deleted`. An entry stays in the group's pending list until
/// it is acknowledged with XACK. Every [`fetch`](EventSubscription::fetch)
/// re-reads this consumer's pending entries first (`XREADGROUP ... 0`), and
/// blocks for new ones (`>`) only when nothing is pending. An entry whose
/// handler failed is therefore delivered again on the next fetch, and a
/// restarted consumer picks up where it left off.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::events::{EventSubscription, CASCADE_SUBSCRIBER};
/// use taskboard_shared::redis::client::{RedisClient, RedisConfig};
/// use taskboard_shared::redis::subscription::RedisSubscription;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let sub = RedisSubscription::new(client, CASCADE_SUBSCRIBER, "worker-1");
/// sub.ensure_group().await?;
///
/// for delivery in sub.fetch(10).await? {
///     println!("board {} deleted", delivery.event.board_id);
///     sub.ack(&delivery.id).await?;
/// }
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use crate::events::serialization::{board_deleted_stream_key, deserialize_event};
use crate::events::{Delivery, EventSubscription, SubscribeError};
use crate::redis::client::RedisClient;

fn unavailable(err: redis::RedisError) -> SubscribeError {
    SubscribeError::Unavailable(err.to_string())
}

/// Runs one Redis command, failing with `Unavailable` once `limit` elapses
async fn bounded<T, F>(command: &str, limit: Duration, fut: F) -> Result<T, SubscribeError>
where
    F: Future<Output = Result<T, redis::RedisError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(unavailable),
        Err(_) => Err(SubscribeError::Unavailable(format!(
            "{} timed out after {}ms",
            command,
            limit.as_millis()
        ))),
    }
}

/// [`EventSubscription`] backed by a Redis consumer group
#[derive(Clone)]
pub struct RedisSubscription {
    client: RedisClient,
    stream_key: String,
    group: String,
    consumer: String,
    block_ms: usize,
}

impl RedisSubscription {
    /// Binds `consumer` to the consumer group named `subscriber`
    pub fn new(client: RedisClient, subscriber: impl Into<String>, consumer: impl Into<String>) -> Self {
        Self {
            client,
            stream_key: board_deleted_stream_key(),
            group: subscriber.into(),
            consumer: consumer.into(),
            block_ms: 5000,
        }
    }

    /// How long a fetch waits for new entries when nothing is pending
    pub fn with_block_ms(mut self, block_ms: usize) -> Self {
        self.block_ms = block_ms;
        self
    }

    /// Creates the consumer group (and stream) if they do not exist
    ///
    /// A new group starts at `0`, so events published before the first
    /// consumer came up are still delivered.
    pub async fn ensure_group(&self) -> Result<(), SubscribeError> {
        let mut conn = self.client.get_connection();
        let create = async {
            let created: Result<(), redis::RedisError> = conn
                .xgroup_create_mkstream(&self.stream_key, &self.group, "0")
                .await;
            match created {
                Ok(()) => Ok(true),
                Err(e) if e.code() == Some("BUSYGROUP") => Ok(false),
                Err(e) => Err(e),
            }
        };

        if bounded("XGROUP CREATE", self.client.command_timeout(), create).await? {
            tracing::info!(stream = %self.stream_key, group = %self.group, "Created consumer group");
        }
        Ok(())
    }

    async fn read(&self, start: &str, max: usize, block: bool) -> Result<StreamReadReply, SubscribeError> {
        let mut opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(max);
        let mut limit = self.client.command_timeout();
        if block {
            opts = opts.block(self.block_ms);
            limit += Duration::from_millis(self.block_ms as u64);
        }

        let mut conn = self.client.get_connection();
        bounded(
            "XREADGROUP",
            limit,
            conn.xread_options(&[&self.stream_key], &[start], &opts),
        )
        .await
    }

    /// Decodes a reply, acknowledging and skipping entries that can never parse
    async fn decode(&self, reply: StreamReadReply) -> Result<Vec<Delivery>, SubscribeError> {
        let mut deliveries = Vec::new();

        for key in reply.keys {
            for entry in key.ids {
                let fields: HashMap<String, String> = entry
                    .map
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), redis::from_redis_value::<String>(v).ok()?)))
                    .collect();

                match deserialize_event(&fields) {
                    Ok(event) => deliveries.push(Delivery { id: entry.id, event }),
                    Err(e) => {
                        tracing::error!(
                            stream_id = %entry.id,
                            error = %e,
                            "Dropping malformed board event"
                        );
                        self.ack(&entry.id).await?;
                    }
                }
            }
        }

        Ok(deliveries)
    }
}

#[async_trait]
impl EventSubscription for RedisSubscription {
    async fn fetch(&self, max: usize) -> Result<Vec<Delivery>, SubscribeError> {
        let pending = self.decode(self.read("0", max, false).await?).await?;
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), group = %self.group, "Redelivering pending events");
            return Ok(pending);
        }

        self.decode(self.read(">", max, true).await?).await
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), SubscribeError> {
        let mut conn = self.client.get_connection();
        let _: i64 = bounded(
            "XACK",
            self.client.command_timeout(),
            conn.xack(&self.stream_key, &self.group, &[delivery_id]),
        )
        .await?;
        Ok(())
    }
}
