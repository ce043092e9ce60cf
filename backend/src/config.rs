use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    /// Filesystem root under which uploaded gallery blobs are stored.
    pub upload_root: PathBuf,
    /// How long an issued password reset token stays redeemable.
    pub reset_token_ttl_minutes: i64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/motorlot".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1);

        let upload_root =
            PathBuf::from(env::var("UPLOAD_ROOT").unwrap_or_else(|_| "./public".to_string()));

        let reset_token_ttl_minutes = env::var("RESET_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            upload_root,
            reset_token_ttl_minutes,
        })
    }
}
