//! Repository functions for user accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::user::{User, UserRole};
use crate::types::UserId;

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password_hash, LOWER(role) AS role, \
     is_active, created_at, updated_at";

/// Finds a user by email address (case-insensitive).
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Finds a user by their ID.
pub async fn find_user_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Checks whether an email or username is already registered.
pub async fn identity_taken(
    pool: &PgPool,
    email: &str,
    username: &str,
) -> Result<bool, sqlx::Error> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) OR username = $2)",
    )
    .bind(email)
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

/// Inserts a new user with the given role.
#[allow(clippy::too_many_arguments)]
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password_hash: &str,
    role: UserRole,
    now: DateTime<Utc>,
) -> Result<User, sqlx::Error> {
    let id = UserId::new();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, username, first_name, last_name, password_hash, role,
                           is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Replaces a user's password hash.
pub async fn update_password_hash(
    pool: &PgPool,
    user_id: UserId,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .bind(now)
        .execute(pool)
        .await
        .map(|_| ())
}
