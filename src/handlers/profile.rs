// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AppError, unique_constraint},
    extract::AppJson,
    models::{
        prompt::PromptSummary,
        user::{MeResponse, PublicProfileResponse, UpdateMeRequest, User, UserResponse},
    },
    pagination::{Page, PageParams},
    utils::jwt::{Claims, OptionalUser},
};

/// Get current user's profile and statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    #[derive(sqlx::FromRow)]
    struct MeRow {
        #[sqlx(flatten)]
        user: User,
        prompt_count: i64,
        total_likes_received: i64,
    }

    // Subqueries for the counts; both tables are indexed on the joined ids.
    let me = sqlx::query_as::<_, MeRow>(
        r#"
        SELECT
            u.*,
            (SELECT COUNT(*) FROM prompts WHERE author_id = u.id) AS prompt_count,
            (SELECT COUNT(*) FROM prompt_likes pl
             JOIN prompts p ON pl.prompt_id = p.id
             WHERE p.author_id = u.id) AS total_likes_received
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: me.user.id,
        email: me.user.email,
        nickname: me.user.nickname,
        role: me.user.role,
        bio: me.user.bio,
        avatar_url: me.user.avatar_url,
        follower_count: me.user.follower_count,
        following_count: me.user.following_count,
        created_at: me.user.created_at,
        prompt_count: me.prompt_count,
        total_likes_received: me.total_likes_received,
    }))
}

/// Update the current user's profile. All fields optional.
pub async fn update_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");
    if let Some(nickname) = &payload.nickname {
        qb.push(", nickname = ").push_bind(nickname);
    }
    if let Some(bio) = &payload.bio {
        qb.push(", bio = ").push_bind(bio);
    }
    if let Some(avatar_url) = &payload.avatar_url {
        qb.push(", avatar_url = ").push_bind(avatar_url);
    }
    qb.push(" WHERE id = ").push_bind(claims.user_id());
    qb.push(" RETURNING *");

    let user: User = qb
        .build_query_as()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            if unique_constraint(&e).is_some() {
                AppError::Conflict("Nickname is already taken".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Get another user's public profile.
/// Unknown and deactivated accounts both report as 404.
pub async fn get_user(
    State(pool): State<PgPool>,
    viewer: OptionalUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    #[derive(sqlx::FromRow)]
    struct ProfileRow {
        id: i64,
        nickname: String,
        bio: Option<String>,
        avatar_url: Option<String>,
        follower_count: i32,
        following_count: i32,
        prompt_count: i64,
    }

    let profile = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT
            u.id, u.nickname, u.bio, u.avatar_url, u.follower_count, u.following_count,
            (SELECT COUNT(*) FROM prompts WHERE author_id = u.id AND is_public = TRUE) AS prompt_count
        FROM users u
        WHERE u.id = $1 AND u.is_active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let is_following = match viewer.user_id() {
        Some(viewer_id) => sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(viewer_id)
        .bind(id)
        .fetch_one(&pool)
        .await?,
        None => false,
    };

    Ok(Json(PublicProfileResponse {
        id: profile.id,
        nickname: profile.nickname,
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        follower_count: profile.follower_count,
        following_count: profile.following_count,
        prompt_count: profile.prompt_count,
        is_following,
    }))
}

const SUMMARY_COLUMNS: &str = r#"
    p.id, p.title, p.description, p.category,
    p.author_id, u.nickname AS author_nickname,
    p.view_count, p.like_count, p.average_rating, p.rating_count, p.is_public,
    COALESCE((SELECT ARRAY_AGG(t.tag ORDER BY t.tag)
              FROM prompt_tags t WHERE t.prompt_id = p.id), '{}') AS tags,
    p.created_at
"#;

async fn list_prompts_by_author(
    pool: &PgPool,
    author_id: i64,
    public_only: bool,
    page: PageParams,
) -> Result<Json<Page<PromptSummary>>, AppError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM prompts p WHERE p.author_id = $1 AND (NOT $2 OR p.is_public = TRUE)",
    )
    .bind(author_id)
    .bind(public_only)
    .fetch_one(pool)
    .await?;

    let prompts = sqlx::query_as::<_, PromptSummary>(&format!(
        r#"
        SELECT {}
        FROM prompts p
        JOIN users u ON p.author_id = u.id
        WHERE p.author_id = $1 AND (NOT $2 OR p.is_public = TRUE)
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3 OFFSET $4
        "#,
        SUMMARY_COLUMNS
    ))
    .bind(author_id)
    .bind(public_only)
    .bind(page.size())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(Json(Page::new(prompts, total, &page)))
}

/// List a user's public prompts.
pub async fn list_user_prompts(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    list_prompts_by_author(&pool, id, true, page).await
}

/// List the current user's prompts, private ones included.
pub async fn list_my_prompts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    list_prompts_by_author(&pool, claims.user_id(), false, page).await
}
