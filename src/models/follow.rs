// src/models/follow.rs

use serde::Serialize;
use sqlx::FromRow;

/// Response for follow/unfollow: the new relationship state and the target
/// user's fresh follower count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub following: bool,
    pub follower_count: i32,
}

/// One user in a followers/following listing.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FollowListItem {
    pub id: i64,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub followed_at: chrono::DateTime<chrono::Utc>,
}
