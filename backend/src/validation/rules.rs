//! Common validation rules shared across request payloads.

use chrono::{Datelike, Utc};
use validator::ValidationError;

/// Validates password strength.
///
/// Requirements:
/// - At least 8 characters
/// - At least one letter and one digit
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::new("password_too_short"));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ValidationError::new("password_needs_letter"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_needs_digit"));
    }

    Ok(())
}

/// Validates a car model year.
///
/// Requirements:
/// - Between 1980 and next calendar year (pre-registered stock)
pub fn validate_model_year(year: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 1;
    if year < 1980 || year > max_year {
        return Err(ValidationError::new("year_out_of_range"));
    }
    Ok(())
}

/// Validates username format.
///
/// Requirements:
/// - Only alphanumeric characters and underscores
/// - 1-50 characters in length
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || username.len() > 50 {
        return Err(ValidationError::new("username_invalid_length"));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}
