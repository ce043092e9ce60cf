//! Back-office endpoints. All routes here sit behind the admin middleware.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::car::{Car, CarPayload, UploadedImagesResponse},
    models::user::{RegisterAdminPayload, UserResponse, UserRole},
    repositories::{car as car_repo, user as user_repo},
    services::uploads::UploadedFile,
    state::AppState,
    types::{CarId, CarImageId},
    utils::password::hash_password,
    validation::Validate,
};

pub async fn create_car(
    State(state): State<AppState>,
    Json(payload): Json<CarPayload>,
) -> Result<Json<Car>, AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let car = car_repo::insert_car(&state.pool, &payload, Utc::now()).await?;
    tracing::info!(car_id = %car.id, "Created car listing");
    Ok(Json(car))
}

pub async fn update_car(
    State(state): State<AppState>,
    Path(car_id): Path<CarId>,
    Json(payload): Json<CarPayload>,
) -> Result<Json<Car>, AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let car = car_repo::update_car(&state.pool, car_id, &payload, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;
    Ok(Json(car))
}

/// Deletes a listing with its whole gallery. Rows go first in one commit;
/// the blobs are cleaned up afterwards, best-effort.
pub async fn delete_car(
    State(state): State<AppState>,
    Path(car_id): Path<CarId>,
) -> Result<Json<Value>, AppError> {
    let locators = car_repo::delete_car(&state.pool, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    state.uploads.cleanup_blobs(&locators).await;

    tracing::info!(car_id = %car_id, images = locators.len(), "Deleted car listing");
    Ok(Json(json!({ "message": "Car deleted" })))
}

/// Accepts a multipart batch of gallery images.
///
/// File parts are taken in order; an optional `primary` text part names the
/// file that should become the gallery primary.
pub async fn upload_images(
    State(state): State<AppState>,
    Path(car_id): Path<CarId>,
    mut multipart: Multipart,
) -> Result<Json<UploadedImagesResponse>, AppError> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut primary_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("primary") {
            primary_name = Some(
                field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?,
            );
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;

        files.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
            make_primary: false,
        });
    }

    if let Some(name) = primary_name {
        if let Some(file) = files.iter_mut().find(|f| f.file_name == name) {
            file.make_primary = true;
        }
    }

    let added = state.uploads.add_images(car_id, files).await?;
    Ok(Json(UploadedImagesResponse {
        added: added.into_iter().map(Into::into).collect(),
    }))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((car_id, image_id)): Path<(CarId, CarImageId)>,
) -> Result<Json<Value>, AppError> {
    state.uploads.remove_image(car_id, image_id).await?;
    Ok(Json(json!({ "message": "Image deleted" })))
}

pub async fn set_primary_image(
    State(state): State<AppState>,
    Path((car_id, image_id)): Path<(CarId, CarImageId)>,
) -> Result<Json<Value>, AppError> {
    state.uploads.set_primary(car_id, image_id).await?;
    Ok(Json(json!({ "message": "Primary image updated" })))
}

pub async fn register_admin(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAdminPayload>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    if user_repo::identity_taken(&state.pool, &payload.email, &payload.username).await? {
        return Err(AppError::Conflict(
            "Email or username already in use".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::InternalServerError)?;
    let user = user_repo::insert_user(
        &state.pool,
        &payload.email,
        &payload.username,
        &payload.first_name,
        &payload.last_name,
        &password_hash,
        UserRole::Admin,
        Utc::now(),
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered administrator account");
    Ok(Json(UserResponse::from(user)))
}
