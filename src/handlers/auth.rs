// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, unique_constraint},
    extract::AppJson,
    models::user::{LoginRequest, RefreshRequest, RegisterRequest, TokenPairResponse, User, UserResponse},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TokenKind, sign_jwt, verify_jwt},
    },
};

fn token_pair(user: &User, config: &Config) -> Result<TokenPairResponse, AppError> {
    let access_token = sign_jwt(
        user.id,
        &user.role,
        TokenKind::Access,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;
    let refresh_token = sign_jwt(
        user.id,
        &user.role,
        TokenKind::Refresh,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )?;

    Ok(TokenPairResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        user: UserResponse::from(user.clone()),
    })
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();

    // Pre-check so the 409 can name the conflicting field; the unique
    // constraints below still backstop concurrent registrations.
    let (email_taken, nickname_taken) = sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT
            EXISTS(SELECT 1 FROM users WHERE email = $1),
            EXISTS(SELECT 1 FROM users WHERE nickname = $2)
        "#,
    )
    .bind(&email)
    .bind(&payload.nickname)
    .fetch_one(&pool)
    .await?;

    if email_taken {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }
    if nickname_taken {
        return Err(AppError::Conflict("Nickname is already taken".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password, nickname)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&hashed_password)
    .bind(&payload.nickname)
    .fetch_one(&pool)
    .await
    .map_err(|e| match unique_constraint(&e) {
        Some(constraint) if constraint.contains("nickname") => {
            AppError::Conflict("Nickname is already taken".to_string())
        }
        Some(_) => AppError::Conflict("Email is already registered".to_string()),
        None => {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Authenticates a user and returns an access/refresh token pair.
///
/// Unknown email and wrong password both report the same 401 so the response
/// does not reveal which accounts exist. Disabled accounts get 403.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;
    if !is_valid {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    Ok(Json(token_pair(&user, &config)?))
}

/// Exchanges a refresh token for a fresh token pair.
///
/// The token must be of the refresh kind and the account must still exist
/// and be active at exchange time.
pub async fn refresh(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_jwt(&payload.refresh_token, &config.jwt_secret)?;
    if claims.kind != TokenKind::Refresh {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.user_id())
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid token".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    Ok(Json(token_pair(&user, &config)?))
}
