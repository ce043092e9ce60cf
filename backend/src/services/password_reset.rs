//! Password reset lifecycle.
//!
//! Tokens are opaque random strings handed to the user out of band; only a
//! SHA-256 digest is persisted. Both entry points answer identically for
//! known and unknown accounts so responses do not reveal which email
//! addresses exist.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::password_reset::PasswordReset;
use crate::models::user::User;
use crate::repositories::{password_reset as reset_repo, user as user_repo};
use crate::types::{PasswordResetId, UserId};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::password::hash_password;
use crate::utils::token::{generate_opaque_token, hash_token};
use crate::validation::rules::validate_password_strength;

/// Persistence seam for the reset lifecycle.
#[async_trait]
pub trait ResetStore: Send + Sync {
    async fn find_active_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn insert_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError>;
    async fn find_valid_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError>;
    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Marks the token used; returns false when it was already consumed.
    async fn consume_reset(&self, id: PasswordResetId, now: DateTime<Utc>)
        -> Result<bool, AppError>;
}

pub struct PgResetStore {
    pool: DbPool,
}

impl PgResetStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ResetStore for PgResetStore {
    async fn find_active_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = user_repo::find_user_by_email(self.pool(), email).await?;
        Ok(user.filter(|u| u.is_active))
    }

    async fn insert_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError> {
        let reset =
            reset_repo::create_password_reset(self.pool(), user_id, token_hash, expires_at, created_at)
                .await?;
        Ok(reset)
    }

    async fn find_valid_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError> {
        Ok(reset_repo::find_valid_reset(self.pool(), user_id, token_hash, now).await?)
    }

    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        user_repo::update_password_hash(self.pool(), user_id, password_hash, now).await?;
        Ok(())
    }

    async fn consume_reset(
        &self,
        id: PasswordResetId,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(reset_repo::consume_reset(self.pool(), id, now).await?)
    }
}

#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn ResetStore>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(pool: DbPool, token_ttl_minutes: i64) -> Self {
        Self::with_parts(
            Arc::new(PgResetStore::new(pool)),
            Arc::new(SystemClock),
            token_ttl_minutes,
        )
    }

    pub fn with_parts(
        store: Arc<dyn ResetStore>,
        clock: Arc<dyn Clock>,
        token_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            clock,
            token_ttl: Duration::minutes(token_ttl_minutes),
        }
    }

    /// Issues a reset token for `email`.
    ///
    /// Returns `Ok(None)` when the account is unknown or inactive; the caller
    /// must respond exactly as it would for a real issuance. The plain token
    /// is returned once and never stored.
    pub async fn issue(&self, email: &str) -> Result<Option<String>, AppError> {
        let Some(user) = self.store.find_active_user_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown or inactive account");
            return Ok(None);
        };

        let token = generate_opaque_token();
        let now = self.clock.now();
        self.store
            .insert_reset(user.id, &hash_token(&token), now + self.token_ttl, now)
            .await?;

        tracing::info!(user_id = %user.id, "Issued password reset token");
        Ok(Some(token))
    }

    /// Redeems a reset token and sets the new password.
    ///
    /// All credential failures (unknown email, bad token, expired token,
    /// already-used token) collapse into the same generic errors. A weak new
    /// password is rejected without consuming the token, so the user can
    /// retry with the same link.
    pub async fn redeem(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let Some(user) = self.store.find_active_user_by_email(email).await? else {
            return Err(AppError::InvalidResetRequest);
        };

        let now = self.clock.now();
        let Some(reset) = self
            .store
            .find_valid_reset(user.id, &hash_token(token), now)
            .await?
        else {
            return Err(AppError::InvalidOrExpiredToken);
        };

        validate_password_strength(new_password).map_err(|_| {
            AppError::Validation(vec![
                "Password must be at least 8 characters and contain a letter and a digit"
                    .to_string(),
            ])
        })?;

        let password_hash = hash_password(new_password).map_err(AppError::InternalServerError)?;
        self.store
            .update_password(user.id, &password_hash, now)
            .await?;

        // The password is already changed at this point. A failure to mark
        // the token used must not surface as a failed reset; it is logged
        // and the token ages out on its own.
        match self.store.consume_reset(reset.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(reset_id = %reset.id, "Reset token was already consumed");
            }
            Err(e) => {
                tracing::error!(
                    reset_id = %reset.id,
                    error = %e,
                    "Password changed but token could not be marked used"
                );
            }
        }

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
