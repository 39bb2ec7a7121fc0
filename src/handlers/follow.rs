// src/handlers/follow.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, unique_constraint},
    handlers::notification::notify,
    models::follow::{FollowListItem, FollowResponse},
    pagination::{Page, PageParams},
    utils::jwt::Claims,
};

/// Follow a user.
///
/// 403 on self-follow, 404 unknown (or deactivated) user, 409 when already
/// following. Bumps both users' denormalized counts.
pub async fn follow_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    if user_id == target_id {
        return Err(AppError::Forbidden("You cannot follow yourself".to_string()));
    }

    let mut tx = pool.begin().await?;

    let target: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;
    if target.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    sqlx::query("INSERT INTO user_follows (follower_id, following_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if unique_constraint(&e).is_some() {
                AppError::Conflict("You are already following this user".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    let follower_count: i32 = sqlx::query_scalar(
        "UPDATE users SET follower_count = follower_count + 1 WHERE id = $1 RETURNING follower_count",
    )
    .bind(target_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET following_count = following_count + 1 WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    // For follow notifications the related entity is the follower.
    notify(&mut tx, target_id, user_id, "follow", Some(user_id)).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(FollowResponse {
            following: true,
            follower_count,
        }),
    ))
}

/// Unfollow a user. 404 when no follow relationship exists.
pub async fn unfollow_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let deleted: Option<i64> = sqlx::query_scalar(
        "DELETE FROM user_follows WHERE follower_id = $1 AND following_id = $2 RETURNING id",
    )
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(&mut *tx)
    .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound(
            "You are not following this user".to_string(),
        ));
    }

    let follower_count: i32 = sqlx::query_scalar(
        "UPDATE users SET follower_count = GREATEST(0, follower_count - 1) WHERE id = $1 RETURNING follower_count",
    )
    .bind(target_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET following_count = GREATEST(0, following_count - 1) WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(FollowResponse {
        following: false,
        follower_count,
    }))
}

/// Lists the users who follow `id`, newest follows first.
pub async fn list_followers(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    list_related(
        &pool,
        id,
        page,
        "f.following_id = $1",
        "u.id = f.follower_id",
    )
    .await
}

/// Lists the users `id` is following.
pub async fn list_following(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    list_related(
        &pool,
        id,
        page,
        "f.follower_id = $1",
        "u.id = f.following_id",
    )
    .await
}

async fn list_related(
    pool: &PgPool,
    id: i64,
    page: PageParams,
    where_clause: &str,
    join_clause: &str,
) -> Result<Json<Page<FollowListItem>>, AppError> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM user_follows f WHERE {}",
        where_clause
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, FollowListItem>(&format!(
        r#"
        SELECT u.id, u.nickname, u.avatar_url, f.created_at AS followed_at
        FROM user_follows f
        JOIN users u ON {}
        WHERE {}
        ORDER BY f.created_at DESC, f.id DESC
        LIMIT $2 OFFSET $3
        "#,
        join_clause, where_clause
    ))
    .bind(id)
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(Json(Page::new(items, total, &page)))
}
