//! Models for password reset functionality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{PasswordResetId, UserId};
use crate::validation::rules;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a password reset token.
pub struct PasswordReset {
    /// Unique identifier for the password reset record.
    pub id: PasswordResetId,
    /// User this reset token belongs to.
    pub user_id: UserId,
    /// SHA-256 hash of the reset token; the raw value is never stored.
    pub token_hash: String,
    /// Timestamp when this token expires.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Timestamp when this token was consumed (null if not yet used).
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordReset {
    /// A token is redeemable iff it is unconsumed and not yet expired.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for requesting a password reset.
pub struct RequestPasswordResetPayload {
    /// Email address of the account requesting a reset.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for resetting a password with a previously issued token.
pub struct ResetPasswordPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Opaque reset token delivered out of band.
    #[validate(length(min = 32, message = "Invalid reset token"))]
    pub token: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_in: Duration, used: bool) -> PasswordReset {
        let now = Utc::now();
        PasswordReset {
            id: PasswordResetId::new(),
            user_id: UserId::new(),
            token_hash: "abc".into(),
            expires_at: now + expires_in,
            created_at: now,
            used_at: used.then_some(now),
        }
    }

    #[test]
    fn fresh_token_is_redeemable() {
        let token = record(Duration::minutes(30), false);
        assert!(token.is_redeemable(Utc::now()));
    }

    #[test]
    fn expired_token_is_not_redeemable() {
        let token = record(Duration::minutes(-1), false);
        assert!(!token.is_redeemable(Utc::now()));
    }

    #[test]
    fn used_token_is_not_redeemable() {
        let token = record(Duration::minutes(30), true);
        assert!(!token.is_redeemable(Utc::now()));
    }
}
