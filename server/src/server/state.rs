//! Application state shared by every handler.

use crate::notifications::NotificationService;
use hotel_booking_core::Clock;
use hotel_booking_core::providers::{
    BookingRepository, ChatRepository, HealthCheck, HotelRepository, NotificationRepository,
    RealtimeEvent, RealtimePublisher, ReviewRepository, RoomRepository, SearchIndex, SessionStore,
    UserRepository,
};
use hotel_booking_web::TopicBroadcaster;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

/// Every repository the API reads or writes.
#[derive(Clone)]
pub struct Repositories {
    /// Users
    pub users: Arc<dyn UserRepository>,
    /// Hotels
    pub hotels: Arc<dyn HotelRepository>,
    /// Rooms and the availability ledger
    pub rooms: Arc<dyn RoomRepository>,
    /// Bookings
    pub bookings: Arc<dyn BookingRepository>,
    /// Reviews
    pub reviews: Arc<dyn ReviewRepository>,
    /// Chat rooms and messages
    pub chat: Arc<dyn ChatRepository>,
    /// Notifications
    pub notifications: Arc<dyn NotificationRepository>,
}

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Repositories
    pub repos: Repositories,
    /// Session store
    pub sessions: Arc<dyn SessionStore>,
    /// Hotel search index
    pub search: Arc<dyn SearchIndex>,
    /// Cross-instance event publisher
    pub publisher: Arc<dyn RealtimePublisher>,
    /// Local fan-out to this instance's WebSocket connections
    pub broadcaster: TopicBroadcaster<RealtimeEvent>,
    /// Persist-and-push notifications
    pub notifier: NotificationService,
    /// Source of "now" and "today"
    pub clock: Arc<dyn Clock>,
    /// Components probed by `/ready`
    pub health_checks: Arc<[Arc<dyn HealthCheck>]>,
    /// Lifetime of new sessions
    pub session_ttl: Duration,
    /// Prometheus renderer, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble the state. The notifier is built from the notification
    /// repository and `publisher`.
    #[must_use]
    pub fn new(
        repos: Repositories,
        sessions: Arc<dyn SessionStore>,
        search: Arc<dyn SearchIndex>,
        publisher: Arc<dyn RealtimePublisher>,
        broadcaster: TopicBroadcaster<RealtimeEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notifier = NotificationService::new(Arc::clone(&repos.notifications), Arc::clone(&publisher));
        Self {
            repos,
            sessions,
            search,
            publisher,
            broadcaster,
            notifier,
            clock,
            health_checks: Arc::new([]),
            session_ttl: Duration::from_secs(604_800),
            metrics: None,
        }
    }

    /// Replace the readiness probes.
    #[must_use]
    pub fn with_health_checks(mut self, checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        self.health_checks = checks.into();
        self
    }

    /// Set the session lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Attach the Prometheus renderer served at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
