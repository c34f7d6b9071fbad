//! Recording realtime publisher.

#![allow(clippy::unwrap_used)] // test infrastructure

use async_trait::async_trait;
use hotel_booking_core::error::PublishError;
use hotel_booking_core::providers::{RealtimeEvent, RealtimePublisher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// [`RealtimePublisher`] that keeps every published `(topic, event)` pair.
///
/// [`RecordingPublisher::set_failing`] makes every publish return
/// [`PublishError::Broker`], for checking that callers tolerate a broker
/// outage.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    published: Arc<RwLock<Vec<(String, RealtimeEvent)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    /// Create an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, RealtimeEvent)> {
        self.published.read().unwrap().clone()
    }

    /// Events published to `topic`.
    #[must_use]
    pub fn events_for(&self, topic: &str) -> Vec<RealtimeEvent> {
        self.published
            .read()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Toggle broker failures.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RealtimePublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, event: &RealtimeEvent) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Broker("broker unavailable".to_string()));
        }
        self.published
            .write()
            .unwrap()
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}
