//! Gallery invariant engine.
//!
//! Pure functions over the ordered image set of one car. The engine owns the
//! gallery rules: primary-flag uniqueness, the image count ceiling, and
//! monotonic sort-order assignment. It knows nothing about blob storage or
//! persistence; the upload orchestrator applies the returned set in one
//! commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CarImageId;

/// Upper bound on gallery size per car.
pub const MAX_IMAGES_PER_CAR: usize = 10;

/// One gallery entry as the engine sees it: a plain value, never a live
/// database handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: CarImageId,
    pub image_url: String,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A not-yet-committed image descriptor handed to [`add_images`].
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Storage locator produced by the blob store.
    pub image_url: String,
    /// Explicit request to become the gallery's primary image.
    pub make_primary: bool,
}

impl NewImage {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            make_primary: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("a car can have up to {MAX_IMAGES_PER_CAR} images")]
    CapacityExceeded,
    #[error("image not found")]
    ImageNotFound,
}

/// Appends a batch of images to the gallery.
///
/// Entries with a blank locator are skipped. Sort orders continue strictly
/// ascending from the current maximum. Primary resolution: the first incoming
/// image with an explicit primary request wins and demotes every other
/// primary; later explicit requests in the same batch are downgraded. When
/// the gallery has no primary at all, the first image processed becomes
/// primary.
pub fn add_images(
    current: Vec<GalleryImage>,
    incoming: &[NewImage],
    now: DateTime<Utc>,
) -> Result<Vec<GalleryImage>, GalleryError> {
    let valid: Vec<&NewImage> = incoming
        .iter()
        .filter(|image| !image.image_url.trim().is_empty())
        .collect();

    if current.len() + valid.len() > MAX_IMAGES_PER_CAR {
        return Err(GalleryError::CapacityExceeded);
    }

    let mut result = current;
    let mut next_sort_order = result.iter().map(|i| i.sort_order).max().unwrap_or(0) + 1;
    let mut has_primary = result.iter().any(|i| i.is_primary);
    let mut explicit_assigned = false;

    for image in valid {
        let wins_explicitly = image.make_primary && !explicit_assigned;
        let should_be_primary = wins_explicitly || !has_primary;

        if should_be_primary {
            for existing in result.iter_mut().filter(|i| i.is_primary) {
                existing.is_primary = false;
            }
            has_primary = true;
            if wins_explicitly {
                explicit_assigned = true;
            }
        }

        result.push(GalleryImage {
            id: CarImageId::new(),
            image_url: image.image_url.trim().to_string(),
            is_primary: should_be_primary,
            sort_order: next_sort_order,
            created_at: now,
        });
        next_sort_order += 1;
    }

    Ok(result)
}

/// Removes one image, returning the new set and the removed entry.
///
/// When the removed image was primary and images remain, the one with the
/// smallest `(sort_order, created_at)` is promoted.
pub fn remove_image(
    current: Vec<GalleryImage>,
    id: CarImageId,
) -> Result<(Vec<GalleryImage>, GalleryImage), GalleryError> {
    let mut result = current;
    let position = result
        .iter()
        .position(|i| i.id == id)
        .ok_or(GalleryError::ImageNotFound)?;
    let removed = result.remove(position);

    if removed.is_primary {
        if let Some(next_primary_id) = result
            .iter()
            .min_by_key(|i| (i.sort_order, i.created_at))
            .map(|i| i.id)
        {
            for image in result.iter_mut() {
                image.is_primary = image.id == next_primary_id;
            }
        }
    }

    Ok((result, removed))
}

/// Makes `id` the sole primary image. Idempotent when already primary.
pub fn set_primary(
    current: Vec<GalleryImage>,
    id: CarImageId,
) -> Result<Vec<GalleryImage>, GalleryError> {
    if !current.iter().any(|i| i.id == id) {
        return Err(GalleryError::ImageNotFound);
    }

    let mut result = current;
    for image in result.iter_mut() {
        image.is_primary = image.id == id;
    }

    Ok(result)
}
