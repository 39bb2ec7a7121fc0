// src/handlers/rating.rs

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
    models::rating::{
        PromptRating, RateRequest, RatingAggregateResponse, RatingListItem,
        RatingMutationResponse, RatingStatsResponse, distribution_from_rows,
    },
    pagination::{Page, PageParams},
    utils::jwt::{Claims, OptionalUser},
};

/// Recomputes a prompt's rating aggregate from scratch.
///
/// The average is the exact mean of all current rows, not an incremental
/// adjustment, so repeated create/update/delete cycles cannot drift. Runs
/// inside the mutating transaction; `AVG` over zero rows yields NULL, which
/// keeps the `average_rating IS NULL <=> rating_count = 0` invariant.
///
/// Callers must have locked the prompt row (`SELECT ... FOR UPDATE`) before
/// touching prompt_ratings. Under READ COMMITTED, an UPDATE that merely waits
/// on the row lock here would still aggregate over its pre-block snapshot and
/// miss a concurrently committed rating; locking up front serializes raters
/// so every statement after the lock sees the committed rows.
async fn recompute_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    prompt_id: i64,
) -> Result<(Option<f64>, i32), AppError> {
    let aggregate = sqlx::query_as::<_, (Option<f64>, i32)>(
        r#"
        UPDATE prompts SET
            average_rating = (SELECT AVG(rating)::DOUBLE PRECISION
                              FROM prompt_ratings WHERE prompt_id = $1),
            rating_count = (SELECT COUNT(*) FROM prompt_ratings WHERE prompt_id = $1)
        WHERE id = $1
        RETURNING average_rating, rating_count
        "#,
    )
    .bind(prompt_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(aggregate)
}

/// Takes the prompt's row lock so concurrent rating mutations serialize.
async fn lock_prompt(tx: &mut Transaction<'_, Postgres>, prompt_id: i64) -> Result<(), AppError> {
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM prompts WHERE id = $1 FOR UPDATE")
        .bind(prompt_id)
        .fetch_optional(&mut **tx)
        .await?;

    if locked.is_none() {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }
    Ok(())
}

/// Creates the current user's rating for a prompt.
///
/// 404 unknown prompt, 403 rating your own prompt, 409 when a rating for
/// this (user, prompt) pair already exists.
pub async fn create_rating(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
    AppJson(payload): AppJson<RateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let (author_id, is_public) = sqlx::query_as::<_, (i64, bool)>(
        "SELECT author_id, is_public FROM prompts WHERE id = $1 FOR UPDATE",
    )
    .bind(prompt_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    if !is_public && user_id != author_id {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    if user_id == author_id {
        return Err(AppError::Forbidden(
            "You cannot rate your own prompt".to_string(),
        ));
    }

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM prompt_ratings WHERE prompt_id = $1 AND user_id = $2")
            .bind(prompt_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already rated this prompt".to_string(),
        ));
    }

    let rating = sqlx::query_as::<_, PromptRating>(
        r#"
        INSERT INTO prompt_ratings (prompt_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(prompt_id)
    .bind(user_id)
    .bind(payload.rating)
    .bind(payload.normalized_comment())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        // Backstop for concurrent double-submits racing the check above.
        if unique_constraint(&e).is_some() {
            AppError::Conflict("You have already rated this prompt".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    let (average_rating, rating_count) = recompute_aggregate(&mut tx, prompt_id).await?;

    notify(&mut tx, author_id, user_id, "rating", Some(prompt_id)).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(RatingMutationResponse {
            rating,
            average_rating,
            rating_count,
        }),
    ))
}

/// Updates the current user's rating on a prompt in place.
/// 404 when the caller has no rating there.
pub async fn update_rating(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
    AppJson(payload): AppJson<RateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    lock_prompt(&mut tx, prompt_id).await?;

    let rating = sqlx::query_as::<_, PromptRating>(
        r#"
        UPDATE prompt_ratings
        SET rating = $3, comment = $4, updated_at = NOW()
        WHERE prompt_id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(prompt_id)
    .bind(user_id)
    .bind(payload.rating)
    .bind(payload.normalized_comment())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Rating not found".to_string()))?;

    let (average_rating, rating_count) = recompute_aggregate(&mut tx, prompt_id).await?;

    tx.commit().await?;

    Ok(Json(RatingMutationResponse {
        rating,
        average_rating,
        rating_count,
    }))
}

/// Deletes the current user's rating on a prompt.
/// When the last rating goes, the average resets to NULL and the count to 0.
pub async fn delete_rating(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    lock_prompt(&mut tx, prompt_id).await?;

    let deleted: Option<i64> = sqlx::query_scalar(
        "DELETE FROM prompt_ratings WHERE prompt_id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(prompt_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound("Rating not found".to_string()));
    }

    let (average_rating, rating_count) = recompute_aggregate(&mut tx, prompt_id).await?;

    tx.commit().await?;

    Ok(Json(RatingAggregateResponse {
        average_rating,
        rating_count,
    }))
}

/// Lists a prompt's ratings with rater nicknames, newest first.
pub async fn list_ratings(
    State(pool): State<PgPool>,
    Path(prompt_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM prompts WHERE id = $1")
        .bind(prompt_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompt_ratings WHERE prompt_id = $1")
        .bind(prompt_id)
        .fetch_one(&pool)
        .await?;

    let ratings = sqlx::query_as::<_, RatingListItem>(
        r#"
        SELECT r.id, r.user_id, u.nickname, r.rating, r.comment, r.created_at, r.updated_at
        FROM prompt_ratings r
        JOIN users u ON r.user_id = u.id
        WHERE r.prompt_id = $1
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(prompt_id)
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(Page::new(ratings, total, &page)))
}

/// Rating statistics for a prompt: average, count, the caller's own rating
/// and a per-star histogram. Always computed by fresh aggregate queries.
pub async fn get_rating_stats(
    State(pool): State<PgPool>,
    viewer: OptionalUser,
    Path(prompt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM prompts WHERE id = $1")
        .bind(prompt_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    let (average_rating, rating_count) = sqlx::query_as::<_, (Option<f64>, i64)>(
        "SELECT AVG(rating)::DOUBLE PRECISION, COUNT(*) FROM prompt_ratings WHERE prompt_id = $1",
    )
    .bind(prompt_id)
    .fetch_one(&pool)
    .await?;

    let my_rating: Option<i16> = match viewer.user_id() {
        Some(user_id) => {
            sqlx::query_scalar("SELECT rating FROM prompt_ratings WHERE prompt_id = $1 AND user_id = $2")
                .bind(prompt_id)
                .bind(user_id)
                .fetch_optional(&pool)
                .await?
        }
        None => None,
    };

    let rows = sqlx::query_as::<_, (i16, i64)>(
        "SELECT rating, COUNT(*) FROM prompt_ratings WHERE prompt_id = $1 GROUP BY rating",
    )
    .bind(prompt_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(RatingStatsResponse {
        average_rating,
        rating_count,
        my_rating,
        distribution: distribution_from_rows(&rows),
    }))
}
