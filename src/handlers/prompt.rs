// src/handlers/prompt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AppError, unique_constraint},
    extract::AppJson,
    handlers::notification::notify,
    models::prompt::{
        CreatePromptRequest, LikeResponse, Prompt, PromptDetail, PromptListParams, PromptSummary,
        UpdatePromptRequest,
    },
    pagination::{Page, PageParams},
    utils::{
        html::clean_html,
        jwt::{Claims, OptionalUser},
    },
};

/// Shared filter clause for public prompt listings.
/// $1 = category, $2 = tag, $3 = ILIKE search pattern.
const LIST_FILTER: &str = r#"
    FROM prompts p
    JOIN users u ON p.author_id = u.id
    WHERE p.is_public = TRUE
      AND ($1::TEXT IS NULL OR p.category = $1)
      AND ($2::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM prompt_tags t WHERE t.prompt_id = p.id AND t.tag = $2))
      AND ($3::TEXT IS NULL OR p.title ILIKE $3 OR p.description ILIKE $3)
"#;

/// Lists public prompts with optional category/tag/keyword filters.
pub async fn list_prompts(
    State(pool): State<PgPool>,
    Query(params): Query<PromptListParams>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let order_by = match params.sort.as_deref() {
        None | Some("latest") => "p.created_at DESC, p.id DESC",
        Some("popular") => "p.like_count DESC, p.created_at DESC",
        Some("rating") => "p.average_rating DESC NULLS LAST, p.rating_count DESC",
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown sort '{}'; expected latest, popular or rating",
                other
            )));
        }
    };

    let search_pattern = params.q.as_ref().map(|k| format!("%{}%", k));

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", LIST_FILTER))
        .bind(&params.category)
        .bind(&params.tag)
        .bind(&search_pattern)
        .fetch_one(&pool)
        .await?;

    let sql = format!(
        r#"
        SELECT
            p.id, p.title, p.description, p.category,
            p.author_id, u.nickname AS author_nickname,
            p.view_count, p.like_count, p.average_rating, p.rating_count, p.is_public,
            COALESCE((SELECT ARRAY_AGG(t.tag ORDER BY t.tag)
                      FROM prompt_tags t WHERE t.prompt_id = p.id), '{{}}') AS tags,
            p.created_at
        {}
        ORDER BY {}
        LIMIT $4 OFFSET $5
        "#,
        LIST_FILTER, order_by
    );

    let prompts = sqlx::query_as::<_, PromptSummary>(&sql)
        .bind(&params.category)
        .bind(&params.tag)
        .bind(&search_pattern)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&pool)
        .await?;

    Ok(Json(Page::new(prompts, total, &page)))
}

/// Row shape shared by detail queries: the prompt plus its author's nickname.
#[derive(sqlx::FromRow)]
struct PromptWithAuthor {
    #[sqlx(flatten)]
    prompt: Prompt,
    author_nickname: String,
}

async fn fetch_detail_parts(
    pool: &PgPool,
    id: i64,
) -> Result<Option<(Prompt, String, Vec<String>)>, AppError> {
    let row = sqlx::query_as::<_, PromptWithAuthor>(
        r#"
        SELECT p.*, u.nickname AS author_nickname
        FROM prompts p
        JOIN users u ON p.author_id = u.id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else { return Ok(None) };

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT tag FROM prompt_tags WHERE prompt_id = $1 ORDER BY tag",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some((row.prompt, row.author_nickname, tags)))
}

async fn viewer_flags(pool: &PgPool, viewer: Option<i64>, prompt_id: i64) -> Result<(bool, bool), AppError> {
    let Some(user_id) = viewer else { return Ok((false, false)) };

    let flags = sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT
            EXISTS(SELECT 1 FROM prompt_likes WHERE user_id = $1 AND prompt_id = $2),
            EXISTS(SELECT 1 FROM prompt_bookmarks WHERE user_id = $1 AND prompt_id = $2)
        "#,
    )
    .bind(user_id)
    .bind(prompt_id)
    .fetch_one(pool)
    .await?;

    Ok(flags)
}

fn detail_response(
    prompt: Prompt,
    author_nickname: String,
    tags: Vec<String>,
    is_liked: bool,
    is_bookmarked: bool,
) -> PromptDetail {
    PromptDetail {
        id: prompt.id,
        title: prompt.title,
        description: prompt.description,
        content: prompt.content,
        category: prompt.category,
        author_id: prompt.author_id,
        author_nickname,
        view_count: prompt.view_count,
        like_count: prompt.like_count,
        average_rating: prompt.average_rating,
        rating_count: prompt.rating_count,
        is_public: prompt.is_public,
        tags,
        is_liked,
        is_bookmarked,
        created_at: prompt.created_at,
        updated_at: prompt.updated_at,
    }
}

/// Creates a new prompt for the current user.
/// Description and content are HTML-sanitized before storage.
pub async fn create_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreatePromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id();
    let description = clean_html(&payload.description);
    let content = clean_html(&payload.content);

    let mut tx = pool.begin().await?;

    let prompt = sqlx::query_as::<_, Prompt>(
        r#"
        INSERT INTO prompts (author_id, title, description, content, category, is_public)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&payload.title)
    .bind(&description)
    .bind(&content)
    .bind(&payload.category)
    .bind(payload.is_public)
    .fetch_one(&mut *tx)
    .await?;

    for tag in &payload.tags {
        sqlx::query("INSERT INTO prompt_tags (prompt_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(prompt.id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
    }

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT tag FROM prompt_tags WHERE prompt_id = $1 ORDER BY tag",
    )
    .bind(prompt.id)
    .fetch_all(&mut *tx)
    .await?;

    let author_nickname = sqlx::query_scalar::<_, String>("SELECT nickname FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(detail_response(prompt, author_nickname, tags, false, false)),
    ))
}

/// Retrieves a single prompt and bumps its view count.
///
/// Private prompts are visible only to their author; everyone else gets a
/// 404 so their existence is not leaked.
pub async fn get_prompt(
    State(pool): State<PgPool>,
    viewer: OptionalUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (mut prompt, author_nickname, tags) = fetch_detail_parts(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    if !prompt.is_public && viewer.user_id() != Some(prompt.author_id) {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    // Every successful detail fetch counts as a view, author included.
    prompt.view_count = sqlx::query_scalar::<_, i32>(
        "UPDATE prompts SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    let (is_liked, is_bookmarked) = viewer_flags(&pool, viewer.user_id(), id).await?;

    Ok(Json(detail_response(
        prompt,
        author_nickname,
        tags,
        is_liked,
        is_bookmarked,
    )))
}

async fn require_author_or_admin(
    pool: &PgPool,
    claims: &Claims,
    prompt_id: i64,
) -> Result<i64, AppError> {
    let author_id: i64 = sqlx::query_scalar("SELECT author_id FROM prompts WHERE id = $1")
        .bind(prompt_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    if claims.user_id() != author_id && claims.role != "admin" {
        return Err(AppError::Forbidden(
            "Only the author can modify this prompt".to_string(),
        ));
    }

    Ok(author_id)
}

/// Partially updates a prompt. Author (or admin) only.
pub async fn update_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdatePromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    require_author_or_admin(&pool, &claims, id).await?;

    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE prompts SET updated_at = NOW()");
    if let Some(title) = &payload.title {
        qb.push(", title = ").push_bind(title);
    }
    if let Some(description) = &payload.description {
        qb.push(", description = ").push_bind(clean_html(description));
    }
    if let Some(content) = &payload.content {
        qb.push(", content = ").push_bind(clean_html(content));
    }
    if let Some(category) = &payload.category {
        qb.push(", category = ").push_bind(category);
    }
    if let Some(is_public) = payload.is_public {
        qb.push(", is_public = ").push_bind(is_public);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(&mut *tx).await?;

    // Tag set is replaced wholesale when provided.
    if let Some(tags) = &payload.tags {
        sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in tags {
            sqlx::query(
                "INSERT INTO prompt_tags (prompt_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let (prompt, author_nickname, tags) = fetch_detail_parts(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;
    let (is_liked, is_bookmarked) = viewer_flags(&pool, Some(claims.user_id()), id).await?;

    Ok(Json(detail_response(
        prompt,
        author_nickname,
        tags,
        is_liked,
        is_bookmarked,
    )))
}

/// Deletes a prompt. Author (or admin) only.
/// Ratings, likes, bookmarks and tags go with it via cascades.
pub async fn delete_prompt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_author_or_admin(&pool, &claims, id).await?;

    sqlx::query("DELETE FROM prompts WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle Like on a prompt.
pub async fn toggle_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(prompt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

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

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM prompt_likes WHERE user_id = $1 AND prompt_id = $2")
            .bind(user_id)
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?;

    let was_liked = existing.is_some();

    let like_count: i32 = if was_liked {
        sqlx::query("DELETE FROM prompt_likes WHERE user_id = $1 AND prompt_id = $2")
            .bind(user_id)
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query_scalar(
            "UPDATE prompts SET like_count = GREATEST(0, like_count - 1) WHERE id = $1 RETURNING like_count",
        )
        .bind(prompt_id)
        .fetch_one(&mut *tx)
        .await?
    } else {
        sqlx::query("INSERT INTO prompt_likes (user_id, prompt_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(prompt_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // Concurrent duplicate handled gracefully
                if unique_constraint(&e).is_some() {
                    AppError::Conflict("Already liked".to_string())
                } else {
                    AppError::from(e)
                }
            })?;

        notify(&mut tx, author_id, user_id, "like", Some(prompt_id)).await?;

        sqlx::query_scalar(
            "UPDATE prompts SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
        )
        .bind(prompt_id)
        .fetch_one(&mut *tx)
        .await?
    };

    tx.commit().await?;

    Ok(Json(LikeResponse {
        liked: !was_liked,
        like_count,
    }))
}
