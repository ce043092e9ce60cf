//! Repository functions for password reset tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::password_reset::PasswordReset;
use crate::types::{PasswordResetId, UserId};

/// Persists a new reset record. Only the token hash is ever stored.
pub async fn create_password_reset(
    pool: &PgPool,
    user_id: UserId,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<PasswordReset, sqlx::Error> {
    let reset_id = PasswordResetId::new();

    sqlx::query_as::<_, PasswordReset>(
        r#"
        INSERT INTO password_resets (id, user_id, token_hash, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, token_hash, expires_at, created_at, used_at
        "#,
    )
    .bind(reset_id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

/// Finds an unconsumed, unexpired reset record for the given user and hash.
pub async fn find_valid_reset(
    pool: &PgPool,
    user_id: UserId,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        r#"
        SELECT id, user_id, token_hash, expires_at, created_at, used_at
        FROM password_resets
        WHERE user_id = $1
        AND token_hash = $2
        AND used_at IS NULL
        AND expires_at > $3
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Consumes a token. The conditional update keeps consumption at-most-once
/// under concurrent redemption; returns whether this call won.
pub async fn consume_reset(
    pool: &PgPool,
    reset_id: PasswordResetId,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE password_resets
        SET used_at = $2
        WHERE id = $1
        AND used_at IS NULL
        "#,
    )
    .bind(reset_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Garbage-collects terminal rows: expired or already consumed.
pub async fn delete_spent_tokens(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM password_resets
        WHERE expires_at < $1
        OR used_at IS NOT NULL
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
