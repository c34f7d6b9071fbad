use async_trait::async_trait;
use hotel_booking_core::error::PublishError;
use hotel_booking_core::providers::{RealtimeEvent, RealtimePublisher};
use hotel_booking_web::TopicBroadcaster;

/// [`RealtimePublisher`] that delivers to this process only.
#[derive(Clone, Default)]
pub struct LocalPublisher {
    broadcaster: TopicBroadcaster<RealtimeEvent>,
}

impl LocalPublisher {
    /// Publish into `broadcaster`.
    #[must_use]
    pub const fn new(broadcaster: TopicBroadcaster<RealtimeEvent>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl RealtimePublisher for LocalPublisher {
    async fn publish(&self, topic: &str, event: &RealtimeEvent) -> Result<(), PublishError> {
        let delivered = self.broadcaster.publish(topic, event.clone()).await;
        tracing::trace!(topic, delivered, "Published locally");
        Ok(())
    }
}
