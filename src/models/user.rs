// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Allowed nickname characters: letters, digits, `_`, `.`, `-`.
static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("nickname regex"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email, stored lowercased.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Unique display name.
    pub nickname: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub bio: Option<String>,
    pub avatar_url: Option<String>,

    pub follower_count: i32,
    pub following_count: i32,

    /// Soft-disable flag; disabled accounts cannot log in or refresh.
    pub is_active: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Public shape of a user, embedded in auth and profile responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: i32,
    pub following_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            role: user.role,
            bio: user.bio,
            avatar_url: user.avatar_url,
            follower_count: user.follower_count,
            following_count: user.following_count,
            created_at: user.created_at,
        }
    }
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Email must be a valid address."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
    #[validate(
        length(
            min = 2,
            max = 30,
            message = "Nickname length must be between 2 and 30 characters."
        ),
        regex(
            path = *NICKNAME_RE,
            message = "Nickname may only contain letters, digits, '_', '.' and '-'."
        )
    )]
    pub nickname: String,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 320))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login/refresh response: token pair plus the authenticated user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserResponse,
}

/// DTO for profile updates. All fields optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(
        length(
            min = 2,
            max = 30,
            message = "Nickname length must be between 2 and 30 characters."
        ),
        regex(
            path = *NICKNAME_RE,
            message = "Nickname may only contain letters, digits, '_', '.' and '-'."
        )
    )]
    pub nickname: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters."))]
    pub bio: Option<String>,
    #[validate(url(message = "Avatar URL must be a valid URL."))]
    pub avatar_url: Option<String>,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: i32,
    pub following_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub prompt_count: i64,
    pub total_likes_received: i64,
}

/// Another user's profile as seen by the (optional) viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub id: i64,
    pub nickname: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: i32,
    pub following_count: i32,
    pub prompt_count: i64,
    pub is_following: bool,
}

/// Admin view of a user account.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
