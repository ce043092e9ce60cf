//! Public, unauthenticated endpoints for browsing the inventory.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppError,
    models::car::{CarDetails, CarImageResponse, CarListItem},
    models::{PaginatedResponse, PaginationQuery},
    repositories::car as car_repo,
    state::AppState,
    types::CarId,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CarSearchQuery {
    /// Free-text search over make, model, variant, color and VIN.
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CarSearchQuery {
    fn pagination(&self) -> PaginationQuery {
        let mut page = PaginationQuery::default();
        if let Some(limit) = self.limit {
            page.limit = limit;
        }
        if let Some(offset) = self.offset {
            page.offset = offset;
        }
        page
    }
}

pub async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<CarSearchQuery>,
) -> Result<Json<PaginatedResponse<CarListItem>>, AppError> {
    let page = query.pagination();
    let search = query.q.as_deref();

    let cars = car_repo::search_cars(&state.pool, search, page.limit(), page.offset()).await?;
    let total = car_repo::count_cars(&state.pool, search).await?;

    Ok(Json(PaginatedResponse::new(
        cars,
        total,
        page.limit(),
        page.offset(),
    )))
}

pub async fn car_details(
    State(state): State<AppState>,
    Path(car_id): Path<CarId>,
) -> Result<Json<CarDetails>, AppError> {
    let car = car_repo::find_car(&state.pool, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    let images = car_repo::list_images(&state.pool, car_id)
        .await?
        .into_iter()
        .map(CarImageResponse::from)
        .collect();

    Ok(Json(CarDetails { car, images }))
}
