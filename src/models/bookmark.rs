// src/models/bookmark.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'bookmark_folders' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkFolder {
    pub id: i64,
    pub user_id: i64,
    /// Unique per user.
    pub name: String,
    pub bookmark_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Handlers store the trimmed name, so the bounds apply to the trimmed form.
/// A raw length check would let a whitespace-only name through as empty.
fn validate_folder_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 50 {
        return Err(ValidationError::new("name")
            .with_message("Folder name must be between 1 and 50 characters.".into()));
    }
    Ok(())
}

/// DTO for creating or renaming a bookmark folder.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FolderNameRequest {
    #[validate(custom(function = validate_folder_name))]
    pub name: String,
}

/// Optional body for the bookmark toggle: target folder for a new bookmark.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBookmarkRequest {
    pub folder_id: Option<i64>,
}

/// Response for the bookmark toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBookmarkResponse {
    pub bookmarked: bool,
    /// How many users currently bookmark this prompt.
    pub bookmark_count: i64,
}

/// DTO for moving a bookmark between folders. NULL target = uncategorized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBookmarkRequest {
    pub folder_id: Option<i64>,
}

/// Query parameters for listing the caller's bookmarks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkListParams {
    pub folder_id: Option<i64>,
    /// When true, only bookmarks without a folder.
    pub uncategorized: Option<bool>,
}

/// One bookmark in a listing, with prompt and folder info joined in.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkListItem {
    pub prompt_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub author_nickname: String,
    pub folder_id: Option<i64>,
    pub folder_name: Option<String>,
    pub bookmarked_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_name_bounds() {
        assert!(FolderNameRequest { name: "Work".to_string() }.validate().is_ok());
        assert!(FolderNameRequest { name: "".to_string() }.validate().is_err());
        assert!(FolderNameRequest { name: "x".repeat(51) }.validate().is_err());
    }

    #[test]
    fn folder_name_bounds_apply_after_trimming() {
        assert!(FolderNameRequest { name: "   ".to_string() }.validate().is_err());
        assert!(FolderNameRequest { name: "  Work  ".to_string() }.validate().is_ok());
        // Padding does not buy room past the 50-char limit either way.
        assert!(FolderNameRequest { name: format!("  {}  ", "x".repeat(51)) }.validate().is_err());
    }
}
