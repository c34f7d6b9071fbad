//! Business metrics for the hotel booking marketplace.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `hotel_bookings_total{status}` - Bookings by lifecycle status reached
//! - `hotel_booking_nights_total` - Room-nights reserved
//! - `hotel_booking_revenue_cents_total` - Booked revenue in cents
//! - `hotel_booking_conflicts_total` - Reservations refused for lack of units
//! - `hotel_chat_messages_total` - Chat messages sent
//! - `hotel_notifications_total{kind}` - Notifications created
//!
//! ## Histograms
//! - `hotel_booking_duration_seconds` - Time spent in the reservation transaction

use hotel_booking_core::types::{BookingStatus, NotificationKind};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Register all metric descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "hotel_bookings_total",
        "Bookings by status reached (pending, confirmed, rejected, cancelled, completed)"
    );
    describe_counter!("hotel_booking_nights_total", "Room-nights reserved");
    describe_counter!(
        "hotel_booking_revenue_cents_total",
        "Revenue of created bookings in cents"
    );
    describe_counter!(
        "hotel_booking_conflicts_total",
        "Reservations refused because a night had too few units"
    );
    describe_histogram!(
        "hotel_booking_duration_seconds",
        "Time spent in the reservation transaction"
    );
    describe_counter!("hotel_chat_messages_total", "Chat messages sent");
    describe_counter!("hotel_notifications_total", "Notifications created by kind");

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder and return its render handle.
///
/// # Errors
///
/// Fails if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_business_metrics();
    Ok(handle)
}

/// Record a created booking.
pub fn record_booking_created(nights: u32, units: u32, revenue_cents: u64, duration_secs: f64) {
    metrics::counter!("hotel_bookings_total", "status" => "pending").increment(1);
    metrics::counter!("hotel_booking_nights_total")
        .increment(u64::from(nights) * u64::from(units));
    metrics::counter!("hotel_booking_revenue_cents_total").increment(revenue_cents);
    metrics::histogram!("hotel_booking_duration_seconds").record(duration_secs);
    tracing::debug!(nights, units, revenue_cents, "Recorded booking_created metric");
}

/// Record a booking reaching `status`.
pub fn record_booking_status(status: BookingStatus) {
    metrics::counter!("hotel_bookings_total", "status" => status.as_str()).increment(1);
}

/// Record a reservation refused for missing units.
pub fn record_booking_conflict() {
    metrics::counter!("hotel_booking_conflicts_total").increment(1);
}

/// Record a chat message.
pub fn record_chat_message() {
    metrics::counter!("hotel_chat_messages_total").increment(1);
}

/// Record a notification.
pub fn record_notification(kind: NotificationKind) {
    metrics::counter!("hotel_notifications_total", "kind" => kind.as_str()).increment(1);
}
