//! In-process topic fan-out for WebSocket connections.
//!
//! ```text
//!  relay / publisher ──publish("chat:42", ev)──► TopicBroadcaster
//!                                                   │ broadcast::Sender per topic
//!                       ┌───────────────────────────┼──────────────┐
//!                       ▼                           ▼              ▼
//!                Subscriptions (conn 1)      Subscriptions (conn 2) ...
//!                one forwarder task per topic ──► mpsc ──► socket writer
//! ```
//!
//! A forwarder that stops drops its receiver and prunes the topic if it was
//! the last one, so topics live only as long as someone listens.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};

/// Per-topic channel capacity.
pub const TOPIC_CAPACITY: usize = 256;

type Channels<E> = Arc<RwLock<HashMap<String, broadcast::Sender<(String, E)>>>>;

/// Topic-keyed broadcast hub.
///
/// Cloning is cheap; clones share the same topics.
pub struct TopicBroadcaster<E>
where
    E: Clone + Send + 'static,
{
    channels: Channels<E>,
}

impl<E> TopicBroadcaster<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Deliver `event` to every current subscriber of `topic`.
    ///
    /// Returns the number of receivers reached. Topics without subscribers are
    /// not created, and a topic whose last subscriber left is dropped.
    pub async fn publish(&self, topic: &str, event: E) -> usize {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(topic) {
                Some(sender) => sender.send((topic.to_string(), event)).unwrap_or(0),
                None => return 0,
            }
        };

        if delivered == 0 {
            self.prune(topic).await;
        }

        delivered
    }

    /// Drop `topic` if nobody listens to it any more.
    async fn prune(&self, topic: &str) {
        let mut channels = self.channels.write().await;
        if channels.get(topic).is_some_and(|s| s.receiver_count() == 0) {
            channels.remove(topic);
            tracing::trace!(topic, "Dropped idle topic");
        }
    }

    /// Subscribe to `topic`, creating it if needed.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<(String, E)> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Number of live topics.
    pub async fn topic_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl<E> Default for TopicBroadcaster<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for TopicBroadcaster<E>
where
    E: Clone + Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

/// The topics one connection listens to, merged into a single queue.
///
/// Each joined topic gets a forwarder task. Leaving a topic or dropping the
/// value stops its forwarders, which then prune their topics.
pub struct Subscriptions<E>
where
    E: Clone + Send + Sync + 'static,
{
    broadcaster: TopicBroadcaster<E>,
    outbound: mpsc::Sender<(String, E)>,
    /// Dropping a sender stops that topic's forwarder.
    forwarders: HashMap<String, oneshot::Sender<()>>,
}

impl<E> Subscriptions<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty subscription set and the queue it feeds.
    #[must_use]
    pub fn new(
        broadcaster: TopicBroadcaster<E>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<(String, E)>) {
        let (outbound, inbound) = mpsc::channel(capacity);
        (
            Self {
                broadcaster,
                outbound,
                forwarders: HashMap::new(),
            },
            inbound,
        )
    }

    /// Start forwarding `topic`. Returns `false` if already joined.
    pub async fn join(&mut self, topic: &str) -> bool {
        if self.forwarders.contains_key(topic) {
            return false;
        }

        let mut rx = self.broadcaster.subscribe(topic).await;
        let (stop, mut stopped) = oneshot::channel::<()>();
        let tx = self.outbound.clone();
        let broadcaster = self.broadcaster.clone();
        let name = topic.to_string();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = &mut stopped => break,
                    received = rx.recv() => received,
                };
                match received {
                    Ok(item) => {
                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %name, skipped, "Subscriber lagging, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            drop(rx);
            broadcaster.prune(&name).await;
        });

        self.forwarders.insert(topic.to_string(), stop);
        true
    }

    /// Stop forwarding `topic`. Returns `false` if it was not joined.
    pub fn leave(&mut self, topic: &str) -> bool {
        self.forwarders.remove(topic).is_some()
    }

    /// Whether `topic` is joined.
    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.forwarders.contains_key(topic)
    }

    /// Number of joined topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forwarders.len()
    }

    /// Whether no topic is joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forwarders.is_empty()
    }
}
