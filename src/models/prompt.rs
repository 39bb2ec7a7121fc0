// src/models/prompt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'prompts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub view_count: i32,
    pub like_count: i32,
    /// NULL exactly when `rating_count` is 0.
    pub average_rating: Option<f64>,
    pub rating_count: i32,
    pub is_public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > 10 {
        return Err(ValidationError::new("tags").with_message("At most 10 tags are allowed.".into()));
    }
    for tag in tags {
        if tag.is_empty() || tag.len() > 30 {
            return Err(ValidationError::new("tags")
                .with_message("Each tag must be between 1 and 30 characters.".into()));
        }
    }
    Ok(())
}

fn default_is_public() -> bool {
    true
}

/// DTO for creating a prompt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters."))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description must be between 1 and 500 characters."
    ))]
    pub description: String,
    #[validate(length(
        min = 1,
        max = 20000,
        message = "Content must be between 1 and 20000 characters."
    ))]
    pub content: String,
    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters."))]
    pub category: String,
    #[validate(custom(function = validate_tags))]
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

/// DTO for partial prompt updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptRequest {
    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters."))]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description must be between 1 and 500 characters."
    ))]
    pub description: Option<String>,
    #[validate(length(
        min = 1,
        max = 20000,
        message = "Content must be between 1 and 20000 characters."
    ))]
    pub content: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters."))]
    pub category: Option<String>,
    #[validate(custom(function = validate_tags))]
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

/// Query parameters for listing prompts.
#[derive(Debug, Deserialize)]
pub struct PromptListParams {
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Search keyword, matched against title and description.
    pub q: Option<String>,
    /// 'latest' (default) | 'popular' | 'rating'.
    pub sort: Option<String>,
}

/// One prompt in a listing, with author and tag info joined in.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromptSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub author_id: i64,
    pub author_nickname: String,
    pub view_count: i32,
    pub like_count: i32,
    pub average_rating: Option<f64>,
    pub rating_count: i32,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Full prompt detail, personalized for the (optional) viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub author_id: i64,
    pub author_nickname: String,
    pub view_count: i32,
    pub like_count: i32,
    pub average_rating: Option<f64>,
    pub rating_count: i32,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Response for the like toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i32,
}
