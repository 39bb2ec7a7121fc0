// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Which of the two token flavors a JWT represents.
///
/// Access tokens authenticate API requests; refresh tokens are only good for
/// `POST /api/auth/refresh`. The kind is carried in the claims so one cannot
/// stand in for the other.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role (e.g., 'user', 'admin').
    pub role: String,
    /// Token flavor: access or refresh.
    pub kind: TokenKind,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The user id carried in `sub`. Tokens are only ever signed with a
    /// numeric id, so a parse failure means a forged token; 0 matches no row.
    pub fn user_id(&self) -> i64 {
        self.sub.parse::<i64>().unwrap_or(0)
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: i64,
    role: &str,
    kind: TokenKind,
    secret: &str,
    ttl_seconds: u64,
) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        kind,
        iat: now,
        exp: now + ttl_seconds as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string of either kind.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Verifies a token and additionally requires it to be an access token.
/// Refresh tokens must never authenticate API requests.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let claims = verify_jwt(token, secret)?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }
    Ok(claims)
}

fn bearer_token(value: Option<&str>) -> Option<&str> {
    match value {
        Some(header) if header.starts_with("Bearer ") => Some(&header[7..]),
        _ => None,
    }
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns the 401 error envelope.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = bearer_token(auth_header)
        .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?;

    let claims = verify_access_token(token, &config.jwt_secret)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `Claims` has
/// the 'admin' role; otherwise returns the 403 envelope.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?;

    if claims.role != "admin" {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}

/// Optional authentication for public read endpoints.
///
/// Extracts `Claims` when a valid access token is present and degrades to
/// anonymous (`None`) when the header is absent or the token does not verify.
/// Public listings use this to fill personalization flags like `isLiked`.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Claims>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(Claims::user_id)
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
    Config: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);

        let claims = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| bearer_token(Some(header)))
            .and_then(|token| verify_access_token(token, &config.jwt_secret).ok());

        Ok(OptionalUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn sign_and_verify_roundtrip() {
        let token = sign_jwt(42, "user", TokenKind::Access, SECRET, 600).unwrap();
        let claims = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = sign_jwt(7, "user", TokenKind::Refresh, SECRET, 600).unwrap();
        assert!(verify_access_token(&token, SECRET).is_err());
        // But it still verifies as a generic token.
        let claims = verify_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = sign_jwt(1, "user", TokenKind::Access, SECRET, 600).unwrap();
        assert!(verify_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_fails() {
        // Expired well past the default leeway.
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = Claims {
            sub: "1".to_string(),
            role: "user".to_string(),
            kind: TokenKind::Access,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn forged_sub_maps_to_no_user() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            role: "user".to_string(),
            kind: TokenKind::Access,
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id(), 0);
    }
}
