//! HTTP API handlers organized by resource:
//! - Hotels: listing, CRUD and the search endpoint
//! - Rooms and their availability ledger
//! - Bookings: transactional create, cancel and status changes
//! - Reviews, chat and notifications
//! - Admin: search reindex
//! - WebSocket: the realtime gateway

pub mod admin;
pub mod availability;
pub mod bookings;
pub mod chat;
pub mod hotels;
pub mod notifications;
pub mod reviews;
pub mod rooms;
pub mod search;
pub mod websocket;

use crate::auth::SessionUser;
use crate::server::AppState;
use hotel_booking_core::error::AuthError;
use hotel_booking_core::providers::HotelSearchDoc;
use hotel_booking_core::types::{Hotel, HotelId};
use hotel_booking_web::WebResult;

/// Load `hotel_id` and check that `user` owns it or is an admin.
pub(crate) async fn managed_hotel(state: &AppState, user: &SessionUser, hotel_id: HotelId) -> WebResult<Hotel> {
    let hotel = state.repos.hotels.get(hotel_id).await?;
    if user.actor().can_manage(hotel.owner_id) {
        Ok(hotel)
    } else {
        tracing::debug!(user_id = %user.user_id, hotel_id = %hotel_id, "Hotel management refused");
        Err(AuthError::Forbidden.into())
    }
}

/// Mirror a hotel into the search index, logging failures.
pub(crate) async fn sync_search(state: &AppState, hotel: &Hotel) {
    let doc = HotelSearchDoc::from(hotel);
    if let Err(error) = state.search.index_hotel(&doc).await {
        tracing::warn!(hotel_id = %hotel.id, %error, "Failed to index hotel");
    }
}
