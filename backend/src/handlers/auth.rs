use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::password_reset::{RequestPasswordResetPayload, ResetPasswordPayload},
    models::user::{LoginRequest, LoginResponse, User, UserResponse},
    repositories::user as user_repo,
    state::AppState,
    utils::{jwt::create_access_token, password::verify_password},
    validation::Validate,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Canned acknowledgement for both known and unknown reset requests.
fn reset_requested_response() -> Json<Value> {
    Json(json!({
        "message": "If an account with that email exists, a reset token has been issued"
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = user_repo::find_user_by_email(&state.pool, &payload.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let matches = verify_password(&payload.password, &user.password_hash)
        .map_err(AppError::InternalServerError)?;
    if !matches {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let access_token = create_access_token(
        user.id.to_string(),
        user.email.clone(),
        user.role.as_str().to_string(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )
    .map_err(AppError::InternalServerError)?;

    Ok(Json(LoginResponse {
        access_token,
        user: UserResponse::from(user),
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Issues a password reset token.
///
/// The response is identical whether or not the email maps to an account, so
/// this endpoint does not reveal which addresses are registered. Delivery of
/// the token is out of band; it never appears in this response.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<RequestPasswordResetPayload>,
) -> Result<Json<Value>, AppError> {
    if payload.validate().is_err() {
        // A malformed email can't match an account; same canned answer.
        return Ok(reset_requested_response());
    }

    // The issued token would be handed to a mailer here. There is no mail
    // integration yet, so it is dropped after being persisted.
    state.resets.issue(&payload.email).await?;

    Ok(reset_requested_response())
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<Value>, AppError> {
    // Shape problems fall out of the lifecycle checks themselves: a garbled
    // email or token can never match a stored record.
    state
        .resets
        .redeem(&payload.email, &payload.token, &payload.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password has been reset" })))
}
