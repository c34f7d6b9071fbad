//! Notification inbox endpoints.

use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::types::{Notification, NotificationId};
use hotel_booking_web::WebResult;
use serde::{Deserialize, Serialize};

/// Inbox query.
#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub page_size: Option<u32>,
}

/// Unread counter.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    /// Unread notifications
    pub count: u64,
}

/// Notifications marked read.
#[derive(Debug, Serialize)]
pub struct MarkedAllRead {
    /// Number updated
    pub updated: u64,
}

/// The caller's notifications, newest first.
pub async fn list_notifications(
    user: SessionUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> WebResult<Json<Paginated<Notification>>> {
    let page = Page::new(query.page, query.page_size);
    Ok(Json(
        state
            .repos
            .notifications
            .list(user.user_id, query.unread_only, page)
            .await?,
    ))
}

/// Unread notifications of the caller.
pub async fn unread_count(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<UnreadCount>> {
    let count = state.repos.notifications.unread_count(user.user_id).await?;
    Ok(Json(UnreadCount { count }))
}

/// Mark one notification read.
pub async fn mark_read(
    user: SessionUser,
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
) -> WebResult<Json<Notification>> {
    Ok(Json(
        state
            .repos
            .notifications
            .mark_read(notification_id, user.user_id)
            .await?,
    ))
}

/// Mark every notification of the caller read.
pub async fn mark_all_read(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<MarkedAllRead>> {
    let updated = state.repos.notifications.mark_all_read(user.user_id).await?;
    Ok(Json(MarkedAllRead { updated }))
}

/// Delete a notification.
pub async fn delete_notification(
    user: SessionUser,
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
) -> WebResult<StatusCode> {
    state
        .repos
        .notifications
        .delete(notification_id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
