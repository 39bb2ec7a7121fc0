// src/handlers/admin.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    error::AppError,
    extract::AppJson,
    models::user::AdminUserResponse,
    pagination::{Page, PageParams},
    utils::jwt::Claims,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(
    State(pool): State<PgPool>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    let users = sqlx::query_as::<_, AdminUserResponse>(
        r#"
        SELECT id, email, nickname, role, is_active, created_at
        FROM users
        ORDER BY id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(Page::new(users, total, &page)))
}

/// DTO for enabling/disabling an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Soft-disables or re-enables a user account.
/// Admin only. Prevents disabling self. Disabled accounts cannot log in or
/// refresh; already-issued access tokens ride out their TTL.
pub async fn set_user_active(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id() && !payload.is_active {
        return Err(AppError::BadRequest("Cannot disable yourself".to_string()));
    }

    let result = sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(payload.is_active)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Moderation removal of any prompt, regardless of author.
/// Admin only.
pub async fn delete_prompt(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
