//! Models for car listings and their image galleries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::services::gallery::GalleryImage;
use crate::types::{CarId, CarImageId};
use crate::validation::rules;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a car listing.
pub struct Car {
    /// Unique identifier for the listing.
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub variant: Option<String>,
    pub year: i32,
    /// Listed price in whole currency units.
    pub price: i64,
    pub mileage_km: i32,
    pub color: Option<String>,
    pub vin: Option<String>,
    pub is_sold: bool,
    pub is_returned: bool,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Bumped on any mutation, including gallery changes.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of one gallery image row.
pub struct CarImage {
    pub id: CarImageId,
    pub car_id: CarId,
    /// Web-facing storage locator for the blob.
    pub image_url: String,
    /// At most one image per car carries this flag.
    pub is_primary: bool,
    /// Dense ascending display order; values are never reused.
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for creating or updating a car listing.
pub struct CarPayload {
    #[validate(length(min = 1, max = 100, message = "Make is required"))]
    pub make: String,
    #[validate(length(min = 1, max = 100, message = "Model is required"))]
    pub model: String,
    pub variant: Option<String>,
    #[validate(custom(function = "rules::validate_model_year"))]
    pub year: i32,
    #[validate(range(min = 1, message = "Price must be greater than 0"))]
    pub price: i64,
    #[validate(range(min = 0, message = "Mileage cannot be negative"))]
    pub mileage_km: i32,
    pub color: Option<String>,
    pub vin: Option<String>,
    #[serde(default)]
    pub is_sold: bool,
    #[serde(default)]
    pub is_returned: bool,
}

impl CarPayload {
    /// Trims required fields and collapses blank optionals to `None`.
    pub fn normalized(mut self) -> Self {
        self.make = self.make.trim().to_string();
        self.model = self.model.trim().to_string();
        self.variant = normalize_optional(self.variant);
        self.color = normalize_optional(self.color);
        self.vin = normalize_optional(self.vin);
        self
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
/// Listing summary returned by the public search endpoint.
pub struct CarListItem {
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub variant: Option<String>,
    pub year: i32,
    pub price: i64,
    pub mileage_km: i32,
    pub is_sold: bool,
    pub is_returned: bool,
    /// Locator of the primary image, when the gallery is non-empty.
    pub primary_image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Full listing details with the ordered gallery.
pub struct CarDetails {
    #[serde(flatten)]
    pub car: Car,
    pub images: Vec<CarImageResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Gallery image as exposed by the API.
pub struct CarImageResponse {
    pub id: CarImageId,
    pub image_url: String,
    pub is_primary: bool,
    pub sort_order: i32,
}

impl From<CarImage> for CarImageResponse {
    fn from(image: CarImage) -> Self {
        Self {
            id: image.id,
            image_url: image.image_url,
            is_primary: image.is_primary,
            sort_order: image.sort_order,
        }
    }
}

impl From<GalleryImage> for CarImageResponse {
    fn from(image: GalleryImage) -> Self {
        Self {
            id: image.id,
            image_url: image.image_url,
            is_primary: image.is_primary,
            sort_order: image.sort_order,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Result of a gallery upload: the locators that were committed.
pub struct UploadedImagesResponse {
    pub added: Vec<CarImageResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_normalization_trims_and_drops_blanks() {
        let payload = CarPayload {
            make: "  Volvo ".into(),
            model: " XC60".into(),
            variant: Some("   ".into()),
            year: 2021,
            price: 28_000,
            mileage_km: 45_000,
            color: Some(" Mussel Blue ".into()),
            vin: None,
            is_sold: false,
            is_returned: false,
        }
        .normalized();

        assert_eq!(payload.make, "Volvo");
        assert_eq!(payload.model, "XC60");
        assert_eq!(payload.variant, None);
        assert_eq!(payload.color.as_deref(), Some("Mussel Blue"));
    }

    #[test]
    fn payload_validation_rejects_nonpositive_price() {
        let payload = CarPayload {
            make: "Volvo".into(),
            model: "XC60".into(),
            variant: None,
            year: 2021,
            price: 0,
            mileage_km: 0,
            color: None,
            vin: None,
            is_sold: false,
            is_returned: false,
        };
        assert!(payload.validate().is_err());
    }
}
