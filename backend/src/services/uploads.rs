//! Upload orchestrator.
//!
//! Blob storage and the record store are not jointly transactional. This
//! service makes "write N blobs + update gallery metadata" appear atomic to
//! the caller: nothing reaches blob storage before the whole batch validates,
//! and every blob written in a call is deleted again if the metadata commit
//! fails for any reason. Deletion runs the other way around (row first, blob
//! second) so metadata can never point at a missing blob; an orphaned blob is
//! the preferred failure mode over a dangling reference.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::repositories::gallery::PgGalleryStore;
use crate::services::gallery::{self, GalleryError, GalleryImage, NewImage, MAX_IMAGES_PER_CAR};
use crate::storage::BlobStore;
use crate::types::{CarId, CarImageId};
use crate::utils::clock::{Clock, SystemClock};

/// Hard ceiling on a single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted file extensions, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// One uploaded file as received from the multipart layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Explicit request to make this image the gallery primary.
    pub make_primary: bool,
}

/// Result of applying one gallery mutation inside a single commit.
pub struct GalleryOutcome {
    /// The full gallery as committed.
    pub images: Vec<GalleryImage>,
    /// The entry removed by the mutation, when there was one.
    pub removed: Option<GalleryImage>,
}

/// A pure gallery-engine step applied between load and commit.
pub type GalleryMutation =
    Box<dyn FnOnce(Vec<GalleryImage>) -> Result<GalleryOutcome, AppError> + Send>;

/// Persistence seam for gallery mutations.
///
/// Implementations must load the car's gallery with a write-intent lock,
/// apply the mutation, and persist the returned set within the same
/// transaction scope, so concurrent mutations on one car are serialized.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn mutate_gallery(
        &self,
        car_id: CarId,
        now: DateTime<Utc>,
        mutation: GalleryMutation,
    ) -> Result<GalleryOutcome, AppError>;
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::CapacityExceeded => AppError::CapacityExceeded(format!(
                "A car can have up to {MAX_IMAGES_PER_CAR} images"
            )),
            GalleryError::ImageNotFound => AppError::NotFound("Image not found".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct UploadService {
    gallery: Arc<dyn GalleryStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl UploadService {
    pub fn new(pool: DbPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_parts(
            Arc::new(PgGalleryStore::new(pool)),
            blobs,
            Arc::new(SystemClock),
        )
    }

    /// Assembles a service from explicit parts; used by tests to substitute
    /// stores and the clock.
    pub fn with_parts(
        gallery: Arc<dyn GalleryStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gallery,
            blobs,
            clock,
        }
    }

    /// Validates, stores, and commits a batch of uploaded images.
    ///
    /// Returns the committed entries for the new images, in gallery order.
    pub async fn add_images(
        &self,
        car_id: CarId,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<GalleryImage>, AppError> {
        // Run detached from the request future so the compensation path still
        // executes when the caller disconnects mid-flight.
        let service = self.clone();
        tokio::spawn(async move { service.add_images_inner(car_id, files).await })
            .await
            .map_err(|e| AppError::InternalServerError(e.into()))?
    }

    async fn add_images_inner(
        &self,
        car_id: CarId,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<GalleryImage>, AppError> {
        let accepted = validate_batch(&files).map_err(AppError::Validation)?;
        if accepted.is_empty() {
            return Ok(Vec::new());
        }

        // Step 2: write every blob, recording what was written so any later
        // failure can undo it.
        let namespace = car_id.as_uuid().simple().to_string();
        let mut written: Vec<String> = Vec::with_capacity(accepted.len());
        let mut descriptors: Vec<NewImage> = Vec::with_capacity(accepted.len());

        for (file, extension) in &accepted {
            match self.blobs.write(&namespace, extension, &file.bytes).await {
                Ok(locator) => {
                    written.push(locator.clone());
                    descriptors.push(NewImage {
                        image_url: locator,
                        make_primary: file.make_primary,
                    });
                }
                Err(e) => {
                    self.cleanup_blobs(&written).await;
                    return Err(AppError::Storage(e));
                }
            }
        }

        // Step 3: one commit for the whole metadata change.
        let now = self.clock.now();
        let result = self
            .gallery
            .mutate_gallery(
                car_id,
                now,
                Box::new(move |current| {
                    let images = gallery::add_images(current, &descriptors, now)?;
                    Ok(GalleryOutcome {
                        images,
                        removed: None,
                    })
                }),
            )
            .await;

        match result {
            Ok(outcome) => {
                let added = outcome
                    .images
                    .into_iter()
                    .filter(|image| written.iter().any(|w| *w == image.image_url))
                    .collect();
                Ok(added)
            }
            Err(e) => {
                // Step 4: compensation. Whatever went wrong (car missing,
                // capacity, commit failure), the written blobs must go.
                self.cleanup_blobs(&written).await;
                Err(e)
            }
        }
    }

    /// Removes one image: record row first, physical blob second.
    pub async fn remove_image(&self, car_id: CarId, image_id: CarImageId) -> Result<(), AppError> {
        let service = self.clone();
        tokio::spawn(async move {
            let now = service.clock.now();
            let outcome = service
                .gallery
                .mutate_gallery(
                    car_id,
                    now,
                    Box::new(move |current| {
                        let (images, removed) = gallery::remove_image(current, image_id)?;
                        Ok(GalleryOutcome {
                            images,
                            removed: Some(removed),
                        })
                    }),
                )
                .await?;

            // The row is gone; the blob deletion is best-effort. A leftover
            // blob is preferable to a row pointing at nothing.
            if let Some(removed) = outcome.removed {
                if let Err(e) = service.blobs.delete(&removed.image_url).await {
                    tracing::warn!(
                        locator = %removed.image_url,
                        error = %e,
                        "Failed to delete blob for removed gallery image"
                    );
                }
            }

            Ok(())
        })
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?
    }

    /// Designates `image_id` as the gallery primary.
    pub async fn set_primary(&self, car_id: CarId, image_id: CarImageId) -> Result<(), AppError> {
        let now = self.clock.now();
        self.gallery
            .mutate_gallery(
                car_id,
                now,
                Box::new(move |current| {
                    let images = gallery::set_primary(current, image_id)?;
                    Ok(GalleryOutcome {
                        images,
                        removed: None,
                    })
                }),
            )
            .await?;
        Ok(())
    }

    /// Best-effort blob deletion; failures are logged, never propagated.
    pub async fn cleanup_blobs(&self, locators: &[String]) {
        for locator in locators {
            if let Err(e) = self.blobs.delete(locator).await {
                tracing::warn!(
                    locator = %locator,
                    error = %e,
                    "Blob cleanup failed; file may be orphaned"
                );
            }
        }
    }
}

/// Checks the whole batch in one pass so the caller sees every problem at
/// once. Empty files are skipped, not rejected. Nothing is written unless
/// every file passes. Accepted files are paired with their normalized
/// extension.
fn validate_batch(files: &[UploadedFile]) -> Result<Vec<(UploadedFile, String)>, Vec<String>> {
    let candidates: Vec<&UploadedFile> = files.iter().filter(|f| !f.bytes.is_empty()).collect();

    let mut errors = Vec::new();

    if candidates.len() > MAX_IMAGES_PER_CAR {
        errors.push(format!(
            "You can upload up to {MAX_IMAGES_PER_CAR} images at once"
        ));
        return Err(errors);
    }

    let mut accepted = Vec::with_capacity(candidates.len());
    for file in candidates {
        let extension = file_extension(&file.file_name);
        match extension {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {
                accepted.push((file.clone(), ext));
            }
            _ => errors.push(format!(
                "'{}' has an unsupported format. Allowed: jpg, jpeg, png, webp",
                file.file_name
            )),
        }

        if file.bytes.len() > MAX_UPLOAD_BYTES {
            errors.push(format!("'{}' exceeds 5 MiB", file.file_name));
        }
    }

    if errors.is_empty() {
        Ok(accepted)
    } else {
        Err(errors)
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
