//! Repository functions for car listings.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::car::{Car, CarImage, CarListItem, CarPayload};
use crate::types::CarId;

const CAR_COLUMNS: &str =
    "id, make, model, variant, year, price, mileage_km, color, vin, is_sold, is_returned, \
     created_at, updated_at";

/// Searches listings over make/model/variant/color/vin, newest changes first.
pub async fn search_cars(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<CarListItem>, sqlx::Error> {
    let term = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    sqlx::query_as::<_, CarListItem>(
        r#"
        SELECT c.id, c.make, c.model, c.variant, c.year, c.price, c.mileage_km,
               c.is_sold, c.is_returned, p.image_url AS primary_image_url
        FROM cars c
        LEFT JOIN car_images p ON p.car_id = c.id AND p.is_primary
        WHERE ($1::TEXT IS NULL
               OR c.make ILIKE $1
               OR c.model ILIKE $1
               OR c.variant ILIKE $1
               OR c.color ILIKE $1
               OR c.vin ILIKE $1)
        ORDER BY c.updated_at DESC, c.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(term)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Total listings matching the search term.
pub async fn count_cars(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    let term = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM cars c
        WHERE ($1::TEXT IS NULL
               OR c.make ILIKE $1
               OR c.model ILIKE $1
               OR c.variant ILIKE $1
               OR c.color ILIKE $1
               OR c.vin ILIKE $1)
        "#,
    )
    .bind(term)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Finds one listing by ID.
pub async fn find_car(pool: &PgPool, id: CarId) -> Result<Option<Car>, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Loads the ordered gallery for one listing.
pub async fn list_images(pool: &PgPool, car_id: CarId) -> Result<Vec<CarImage>, sqlx::Error> {
    sqlx::query_as::<_, CarImage>(
        "SELECT id, car_id, image_url, is_primary, sort_order, created_at \
         FROM car_images WHERE car_id = $1 ORDER BY sort_order, created_at",
    )
    .bind(car_id)
    .fetch_all(pool)
    .await
}

/// Inserts a new listing.
pub async fn insert_car(
    pool: &PgPool,
    payload: &CarPayload,
    now: DateTime<Utc>,
) -> Result<Car, sqlx::Error> {
    let id = CarId::new();

    sqlx::query_as::<_, Car>(&format!(
        r#"
        INSERT INTO cars (id, make, model, variant, year, price, mileage_km, color, vin,
                          is_sold, is_returned, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING {CAR_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&payload.make)
    .bind(&payload.model)
    .bind(&payload.variant)
    .bind(payload.year)
    .bind(payload.price)
    .bind(payload.mileage_km)
    .bind(&payload.color)
    .bind(&payload.vin)
    .bind(payload.is_sold)
    .bind(payload.is_returned)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Updates descriptive attributes of a listing, bumping `updated_at`.
pub async fn update_car(
    pool: &PgPool,
    id: CarId,
    payload: &CarPayload,
    now: DateTime<Utc>,
) -> Result<Option<Car>, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!(
        r#"
        UPDATE cars
        SET make = $2, model = $3, variant = $4, year = $5, price = $6, mileage_km = $7,
            color = $8, vin = $9, is_sold = $10, is_returned = $11, updated_at = $12
        WHERE id = $1
        RETURNING {CAR_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&payload.make)
    .bind(&payload.model)
    .bind(&payload.variant)
    .bind(payload.year)
    .bind(payload.price)
    .bind(payload.mileage_km)
    .bind(&payload.color)
    .bind(&payload.vin)
    .bind(payload.is_sold)
    .bind(payload.is_returned)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Deletes a listing and its gallery rows in one transaction.
///
/// The gallery cascade is an application-level rule rather than a database
/// cascade, so callers receive every image locator for blob cleanup. Returns
/// `None` when the listing does not exist.
pub async fn delete_car(pool: &PgPool, id: CarId) -> Result<Option<Vec<String>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM cars WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let locators: Vec<(String,)> =
        sqlx::query_as("SELECT image_url FROM car_images WHERE car_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM car_images WHERE car_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM cars WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Some(locators.into_iter().map(|(url,)| url).collect()))
}
