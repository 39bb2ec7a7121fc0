// src/handlers/bookmark.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::{AppError, unique_constraint},
    extract::AppJson,
    handlers::notification::notify,
    models::bookmark::{
        BookmarkFolder, BookmarkListItem, BookmarkListParams, FolderNameRequest,
        MoveBookmarkRequest, ToggleBookmarkRequest, ToggleBookmarkResponse,
    },
    pagination::{Page, PageParams},
    utils::jwt::Claims,
};

/// Loads a folder and verifies it belongs to `user_id`.
/// Reports foreign folders as 404 so their existence is not leaked.
async fn owned_folder(
    tx: &mut Transaction<'_, Postgres>,
    folder_id: i64,
    user_id: i64,
) -> Result<i64, AppError> {
    let id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM bookmark_folders WHERE id = $1 AND user_id = $2")
            .bind(folder_id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

    id.ok_or_else(|| AppError::NotFound("Bookmark folder not found".to_string()))
}

async fn adjust_folder_count(
    tx: &mut Transaction<'_, Postgres>,
    folder_id: Option<i64>,
    delta: i32,
) -> Result<(), AppError> {
    if let Some(folder_id) = folder_id {
        sqlx::query(
            "UPDATE bookmark_folders SET bookmark_count = GREATEST(0, bookmark_count + $2) WHERE id = $1",
        )
        .bind(folder_id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Toggle Bookmark on a prompt.
///
/// Creates the bookmark when absent (optionally into a folder the caller
/// owns), removes it when present. Returns the new state and how many users
/// bookmark the prompt.
pub async fn toggle_bookmark(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
    payload: Option<AppJson<ToggleBookmarkRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let target_folder = payload.map(|AppJson(p)| p.folder_id).unwrap_or(None);

    let mut tx = pool.begin().await?;

    let (author_id, is_public) =
        sqlx::query_as::<_, (i64, bool)>("SELECT author_id, is_public FROM prompts WHERE id = $1")
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    if !is_public && user_id != author_id {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    let existing: Option<(i64, Option<i64>)> = sqlx::query_as(
        "SELECT id, folder_id FROM prompt_bookmarks WHERE user_id = $1 AND prompt_id = $2",
    )
    .bind(user_id)
    .bind(prompt_id)
    .fetch_optional(&mut *tx)
    .await?;

    let bookmarked = match existing {
        Some((bookmark_id, folder_id)) => {
            sqlx::query("DELETE FROM prompt_bookmarks WHERE id = $1")
                .bind(bookmark_id)
                .execute(&mut *tx)
                .await?;
            adjust_folder_count(&mut tx, folder_id, -1).await?;
            false
        }
        None => {
            if let Some(folder_id) = target_folder {
                owned_folder(&mut tx, folder_id, user_id).await?;
            }

            sqlx::query("INSERT INTO prompt_bookmarks (user_id, prompt_id, folder_id) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(prompt_id)
                .bind(target_folder)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    // Concurrent duplicate handled gracefully
                    if unique_constraint(&e).is_some() {
                        AppError::Conflict("Already bookmarked".to_string())
                    } else {
                        AppError::from(e)
                    }
                })?;
            adjust_folder_count(&mut tx, target_folder, 1).await?;

            notify(&mut tx, author_id, user_id, "bookmark", Some(prompt_id)).await?;
            true
        }
    };

    let bookmark_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM prompt_bookmarks WHERE prompt_id = $1")
            .bind(prompt_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(Json(ToggleBookmarkResponse {
        bookmarked,
        bookmark_count,
    }))
}

/// Lists the current user's bookmarks, optionally scoped to one folder or
/// to the uncategorized bucket.
pub async fn list_my_bookmarks(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<BookmarkListParams>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let uncategorized = params.uncategorized.unwrap_or(false);

    let filter = r#"
        FROM prompt_bookmarks b
        JOIN prompts p ON b.prompt_id = p.id
        JOIN users u ON p.author_id = u.id
        LEFT JOIN bookmark_folders f ON b.folder_id = f.id
        WHERE b.user_id = $1
          AND ($2::BIGINT IS NULL OR b.folder_id = $2)
          AND (NOT $3 OR b.folder_id IS NULL)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", filter))
        .bind(user_id)
        .bind(params.folder_id)
        .bind(uncategorized)
        .fetch_one(&pool)
        .await?;

    let items = sqlx::query_as::<_, BookmarkListItem>(&format!(
        r#"
        SELECT
            b.prompt_id, p.title, p.description, p.category,
            u.nickname AS author_nickname,
            b.folder_id, f.name AS folder_name,
            b.created_at AS bookmarked_at
        {}
        ORDER BY b.created_at DESC, b.id DESC
        LIMIT $4 OFFSET $5
        "#,
        filter
    ))
    .bind(user_id)
    .bind(params.folder_id)
    .bind(uncategorized)
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(Page::new(items, total, &page)))
}

/// Lists the current user's bookmark folders with their counts.
pub async fn list_folders(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let folders = sqlx::query_as::<_, BookmarkFolder>(
        "SELECT * FROM bookmark_folders WHERE user_id = $1 ORDER BY name",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(folders))
}

/// Creates a bookmark folder. Names are unique per user.
pub async fn create_folder(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<FolderNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let folder = sqlx::query_as::<_, BookmarkFolder>(
        "INSERT INTO bookmark_folders (user_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(claims.user_id())
    .bind(payload.name.trim())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if unique_constraint(&e).is_some() {
            AppError::Conflict(format!("Folder '{}' already exists", payload.name.trim()))
        } else {
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(folder)))
}

/// Renames a bookmark folder.
pub async fn rename_folder(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(folder_id): Path<i64>,
    AppJson(payload): AppJson<FolderNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let folder = sqlx::query_as::<_, BookmarkFolder>(
        "UPDATE bookmark_folders SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(folder_id)
    .bind(claims.user_id())
    .bind(payload.name.trim())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if unique_constraint(&e).is_some() {
            AppError::Conflict(format!("Folder '{}' already exists", payload.name.trim()))
        } else {
            AppError::from(e)
        }
    })?
    .ok_or_else(|| AppError::NotFound("Bookmark folder not found".to_string()))?;

    Ok(Json(folder))
}

/// Deletes a bookmark folder.
///
/// Its bookmarks survive: they move to uncategorized (NULL folder) in the
/// same transaction.
pub async fn delete_folder(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(folder_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    owned_folder(&mut tx, folder_id, user_id).await?;

    sqlx::query("UPDATE prompt_bookmarks SET folder_id = NULL WHERE folder_id = $1")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM bookmark_folders WHERE id = $1")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Moves a bookmark between folders. NULL target = uncategorized.
pub async fn move_bookmark(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
    AppJson(payload): AppJson<MoveBookmarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let (bookmark_id, old_folder): (i64, Option<i64>) = sqlx::query_as(
        "SELECT id, folder_id FROM prompt_bookmarks WHERE user_id = $1 AND prompt_id = $2",
    )
    .bind(user_id)
    .bind(prompt_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Bookmark not found".to_string()))?;

    if let Some(folder_id) = payload.folder_id {
        owned_folder(&mut tx, folder_id, user_id).await?;
    }

    if old_folder != payload.folder_id {
        sqlx::query("UPDATE prompt_bookmarks SET folder_id = $2 WHERE id = $1")
            .bind(bookmark_id)
            .bind(payload.folder_id)
            .execute(&mut *tx)
            .await?;

        adjust_folder_count(&mut tx, old_folder, -1).await?;
        adjust_folder_count(&mut tx, payload.folder_id, 1).await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "promptId": prompt_id,
        "folderId": payload.folder_id
    })))
}
