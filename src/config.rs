// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Default lifetime of an access token: 1 hour.
pub const DEFAULT_ACCESS_TOKEN_TTL: u64 = 3600;

/// Default lifetime of a refresh token: 14 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: u64 = 14 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl: u64,
    pub server_port: u16,
    pub rust_log: String,
    /// Optional bootstrap admin account, seeded at startup when all three are set.
    pub admin_email: Option<String>,
    pub admin_nickname: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let access_token_ttl = env::var("ACCESS_TOKEN_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL);

        let refresh_token_ttl = env::var("REFRESH_TOKEN_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL);

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            server_port,
            rust_log,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_nickname: env::var("ADMIN_NICKNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}
