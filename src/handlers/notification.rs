// src/handlers/notification.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::AppError,
    models::notification::{NotificationListItem, NotificationListParams},
    pagination::{Page, PageParams},
    utils::jwt::Claims,
};

/// Inserts a notification row inside the caller's transaction.
///
/// Runs in the same transaction as the triggering write so the fan-out cannot
/// outlive a rolled-back action. Self-notifications are skipped.
pub async fn notify(
    tx: &mut Transaction<'_, Postgres>,
    recipient_id: i64,
    sender_id: i64,
    kind: &str,
    related_id: Option<i64>,
) -> Result<(), AppError> {
    if recipient_id == sender_id {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, type, related_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(kind)
    .bind(related_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// List the current user's notifications, newest first.
pub async fn list_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NotificationListParams>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let unread_only = params.unread_only.unwrap_or(false);

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND (NOT $2 OR is_read = FALSE)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, NotificationListItem>(
        r#"
        SELECT
            n.id, n.sender_id, u.nickname AS sender_nickname,
            n.type AS kind, n.related_id, n.is_read, n.read_at, n.created_at
        FROM notifications n
        LEFT JOIN users u ON n.sender_id = u.id
        WHERE n.recipient_id = $1 AND (NOT $2 OR n.is_read = FALSE)
        ORDER BY n.created_at DESC, n.id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(Page::new(items, total, &page)))
}

/// Number of unread notifications for the current user.
pub async fn unread_count(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
    )
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "count": count })))
}

/// Mark a single notification as read.
/// 404 when the row does not exist or belongs to someone else.
pub async fn mark_read(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = TRUE, read_at = NOW()
        WHERE id = $1 AND recipient_id = $2 AND is_read = FALSE
        "#,
    )
    .bind(id)
    .bind(claims.user_id())
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish "already read" (fine) from "not yours / missing" (404).
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM notifications WHERE id = $1 AND recipient_id = $2")
                .bind(id)
                .bind(claims.user_id())
                .fetch_optional(&pool)
                .await?;

        if exists.is_none() {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Mark all of the current user's notifications as read.
/// Returns how many rows were flipped.
pub async fn mark_all_read(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = TRUE, read_at = NOW()
        WHERE recipient_id = $1 AND is_read = FALSE
        "#,
    )
    .bind(claims.user_id())
    .execute(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "markedRead": result.rows_affected()
    })))
}
