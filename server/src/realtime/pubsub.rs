use async_trait::async_trait;
use futures::StreamExt;
use hotel_booking_core::error::PublishError;
use hotel_booking_core::providers::{RealtimeEvent, RealtimePublisher};
use hotel_booking_web::TopicBroadcaster;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn channel_name(prefix: &str, topic: &str) -> String {
    format!("{prefix}:{topic}")
}

fn topic_of<'a>(prefix: &str, channel: &'a str) -> Option<&'a str> {
    channel
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .filter(|topic| !topic.is_empty())
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// [`RealtimePublisher`] that runs `PUBLISH {prefix}:{topic} <json>`.
#[derive(Clone)]
pub struct RedisPublisher {
    conn_manager: ConnectionManager,
    prefix: String,
}

impl RedisPublisher {
    /// Publish through `conn_manager` under `prefix`.
    #[must_use]
    pub fn new(conn_manager: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn_manager,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl RealtimePublisher for RedisPublisher {
    async fn publish(&self, topic: &str, event: &RealtimeEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event).map_err(|e| PublishError::Encode(e.to_string()))?;
        let mut conn = self.conn_manager.clone();
        let receivers: i64 = conn
            .publish(channel_name(&self.prefix, topic), payload)
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;
        tracing::trace!(topic, receivers, "Published to Redis");
        Ok(())
    }
}

/// Background task relaying Redis pub/sub into the local broadcaster.
///
/// Reconnects with exponential backoff until the shutdown signal fires.
pub struct RedisRelay {
    client: redis::Client,
    prefix: String,
    broadcaster: TopicBroadcaster<RealtimeEvent>,
}

impl RedisRelay {
    /// Relay `{prefix}:*` from `client` into `broadcaster`.
    #[must_use]
    pub fn new(
        client: redis::Client,
        prefix: impl Into<String>,
        broadcaster: TopicBroadcaster<RealtimeEvent>,
    ) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            broadcaster,
        }
    }

    /// Run on the tokio runtime until `shutdown` fires.
    #[must_use]
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                result = self.relay_once() => match result {
                    Ok(()) => {
                        tracing::warn!("Redis pub/sub stream ended, reconnecting");
                        backoff = INITIAL_BACKOFF;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, retry_in_ms = backoff.as_millis(), "Redis relay failed");
                    }
                },
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                () = tokio::time::sleep(backoff) => {}
            }
            backoff = next_backoff(backoff);
        }
        tracing::info!("Redis relay stopped");
    }

    async fn relay_once(&self) -> anyhow::Result<()> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.psubscribe(format!("{}:*", self.prefix)).await?;
        tracing::info!(prefix = %self.prefix, "Redis relay subscribed");

        let mut messages = std::pin::pin!(pubsub.on_message());
        while let Some(message) = messages.next().await {
            let channel = message.get_channel_name();
            let Some(topic) = topic_of(&self.prefix, channel) else {
                tracing::debug!(channel, "Ignoring message on unexpected channel");
                continue;
            };

            match serde_json::from_slice::<RealtimeEvent>(message.get_payload_bytes()) {
                Ok(event) => {
                    self.broadcaster.publish(topic, event).await;
                }
                Err(e) => tracing::warn!(channel, error = %e, "Dropping undecodable realtime event"),
            }
        }
        Ok(())
    }
}
