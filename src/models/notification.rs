// src/models/notification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One notification in a listing, with the sender's nickname joined in.
///
/// `kind` is one of 'like' | 'rating' | 'follow' | 'bookmark'; `related_id`
/// points at the prompt (like/rating/bookmark) or the follower (follow).
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListItem {
    pub id: i64,
    pub sender_id: Option<i64>,
    pub sender_nickname: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListParams {
    /// When true, only unread notifications.
    pub unread_only: Option<bool>,
}
