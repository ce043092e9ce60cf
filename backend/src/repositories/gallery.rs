//! Postgres-backed gallery store.
//!
//! Gallery mutations on one car are serialized by taking a row lock on the
//! car inside a single transaction: load the current set, apply the engine's
//! mutation, persist the returned set, commit. Two concurrent mutations can
//! therefore never observe the same "current set".

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::car::CarImage;
use crate::services::gallery::GalleryImage;
use crate::services::uploads::{GalleryMutation, GalleryOutcome, GalleryStore};
use crate::types::CarId;

#[derive(Clone)]
pub struct PgGalleryStore {
    pool: DbPool,
}

impl PgGalleryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GalleryStore for PgGalleryStore {
    async fn mutate_gallery(
        &self,
        car_id: CarId,
        now: DateTime<Utc>,
        mutation: GalleryMutation,
    ) -> Result<GalleryOutcome, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;

        let locked: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM cars WHERE id = $1 FOR UPDATE")
            .bind(car_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;
        if locked.is_none() {
            return Err(AppError::NotFound("Car not found".to_string()));
        }

        let rows: Vec<CarImage> = sqlx::query_as(
            "SELECT id, car_id, image_url, is_primary, sort_order, created_at \
             FROM car_images WHERE car_id = $1 ORDER BY sort_order, created_at",
        )
        .bind(car_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::Persistence(e.into()))?;

        let current = rows
            .into_iter()
            .map(|row| GalleryImage {
                id: row.id,
                image_url: row.image_url,
                is_primary: row.is_primary,
                sort_order: row.sort_order,
                created_at: row.created_at,
            })
            .collect();

        // Engine errors roll the transaction back on drop.
        let outcome = mutation(current)?;

        sqlx::query("DELETE FROM car_images WHERE car_id = $1")
            .bind(car_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;

        for image in &outcome.images {
            sqlx::query(
                "INSERT INTO car_images (id, car_id, image_url, is_primary, sort_order, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(image.id)
            .bind(car_id)
            .bind(&image.image_url)
            .bind(image.is_primary)
            .bind(image.sort_order)
            .bind(image.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;
        }

        sqlx::query("UPDATE cars SET updated_at = $2 WHERE id = $1")
            .bind(car_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Persistence(e.into()))?;

        Ok(outcome)
    }
}
