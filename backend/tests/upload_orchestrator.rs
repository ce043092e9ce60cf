//! Compensation behavior of the upload orchestrator, exercised against
//! in-memory stores so failures can be injected deterministically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use motorlot_backend::error::AppError;
use motorlot_backend::services::gallery::GalleryImage;
use motorlot_backend::services::uploads::{
    GalleryMutation, GalleryOutcome, GalleryStore, UploadService, UploadedFile,
};
use motorlot_backend::storage::BlobStore;
use motorlot_backend::types::{CarId, CarImageId};
use motorlot_backend::utils::clock::ManualClock;

/// Blob store that records writes and deletes, optionally failing writes
/// after a configured number of successes.
#[derive(Default)]
struct RecordingBlobStore {
    writes: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    write_budget: Option<usize>,
    write_count: AtomicUsize,
}

impl RecordingBlobStore {
    fn failing_after(successes: usize) -> Self {
        Self {
            write_budget: Some(successes),
            ..Self::default()
        }
    }

    fn written(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn write(
        &self,
        namespace: &str,
        extension: &str,
        _bytes: &[u8],
    ) -> anyhow::Result<String> {
        let n = self.write_count.fetch_add(1, Ordering::SeqCst);
        if let Some(budget) = self.write_budget {
            if n >= budget {
                anyhow::bail!("disk full");
            }
        }
        let locator = format!("/uploads/cars/{namespace}/{n}.{extension}");
        self.writes.lock().unwrap().push(locator.clone());
        Ok(locator)
    }

    async fn delete(&self, locator: &str) -> anyhow::Result<()> {
        self.deletes.lock().unwrap().push(locator.to_string());
        Ok(())
    }
}

/// Gallery store that applies mutations to an in-memory set, optionally
/// refusing the commit.
#[derive(Default)]
struct InMemoryGalleryStore {
    images: Mutex<Vec<GalleryImage>>,
    fail_commit: AtomicBool,
}

impl InMemoryGalleryStore {
    fn refuse_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Vec<GalleryImage> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl GalleryStore for InMemoryGalleryStore {
    async fn mutate_gallery(
        &self,
        _car_id: CarId,
        _now: DateTime<Utc>,
        mutation: GalleryMutation,
    ) -> Result<GalleryOutcome, AppError> {
        let current = self.snapshot();
        let outcome = mutation(current)?;
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(anyhow::anyhow!("commit refused")));
        }
        *self.images.lock().unwrap() = outcome.images.clone();
        Ok(outcome)
    }
}

fn service(
    blobs: Arc<RecordingBlobStore>,
    gallery: Arc<InMemoryGalleryStore>,
) -> UploadService {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
    UploadService::with_parts(gallery, blobs, Arc::new(clock))
}

fn jpeg(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        bytes: vec![0u8; 128],
        make_primary: false,
    }
}

#[tokio::test]
async fn valid_batch_is_written_and_committed() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let added = svc
        .add_images(CarId::new(), vec![jpeg("front.jpg"), jpeg("rear.png")])
        .await
        .expect("upload succeeds");

    assert_eq!(added.len(), 2);
    assert_eq!(blobs.written().len(), 2);
    assert!(blobs.deleted().is_empty());

    let committed = gallery.snapshot();
    assert_eq!(committed.len(), 2);
    assert_eq!(committed.iter().filter(|i| i.is_primary).count(), 1);
}

#[tokio::test]
async fn invalid_batch_writes_nothing() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let oversized = UploadedFile {
        file_name: "huge.jpg".to_string(),
        bytes: vec![0u8; 5 * 1024 * 1024 + 1],
        make_primary: false,
    };
    let err = svc
        .add_images(CarId::new(), vec![jpeg("ok.jpg"), jpeg("bad.gif"), oversized])
        .await
        .expect_err("batch must be rejected");

    match err {
        AppError::Validation(messages) => {
            assert_eq!(messages.len(), 2);
            assert!(messages.iter().any(|m| m.contains("bad.gif")));
            assert!(messages.iter().any(|m| m.contains("huge.jpg")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // One bad file keeps the whole batch out of storage.
    assert!(blobs.written().is_empty());
    assert!(gallery.snapshot().is_empty());
}

#[tokio::test]
async fn commit_failure_deletes_every_written_blob() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    gallery.refuse_commits();
    let svc = service(blobs.clone(), gallery.clone());

    let err = svc
        .add_images(CarId::new(), vec![jpeg("a.jpg"), jpeg("b.jpg")])
        .await
        .expect_err("commit failure must surface");
    assert!(matches!(err, AppError::Persistence(_)));

    let written = blobs.written();
    assert_eq!(written.len(), 2);
    assert_eq!(blobs.deleted(), written);
    assert!(gallery.snapshot().is_empty());
}

#[tokio::test]
async fn mid_batch_write_failure_undoes_earlier_writes() {
    let blobs = Arc::new(RecordingBlobStore::failing_after(1));
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let err = svc
        .add_images(CarId::new(), vec![jpeg("a.jpg"), jpeg("b.jpg")])
        .await
        .expect_err("write failure must surface");
    assert!(matches!(err, AppError::Storage(_)));

    assert_eq!(blobs.written().len(), 1);
    assert_eq!(blobs.deleted(), blobs.written());
    assert!(gallery.snapshot().is_empty());
}

#[tokio::test]
async fn capacity_overflow_discovered_at_commit_rides_compensation() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let nine: Vec<UploadedFile> = (0..9).map(|i| jpeg(&format!("{i}.jpg"))).collect();
    svc.add_images(CarId::new(), nine).await.expect("seed nine");

    let err = svc
        .add_images(CarId::new(), vec![jpeg("x.jpg"), jpeg("y.jpg")])
        .await
        .expect_err("ceiling must hold");
    assert!(matches!(err, AppError::CapacityExceeded(_)));

    // The two rejected blobs were written, then compensated away.
    assert_eq!(blobs.written().len(), 11);
    assert_eq!(blobs.deleted().len(), 2);
    assert_eq!(gallery.snapshot().len(), 9);
}

#[tokio::test]
async fn remove_image_deletes_row_then_blob() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let car_id = CarId::new();
    let added = svc
        .add_images(car_id, vec![jpeg("a.jpg"), jpeg("b.jpg")])
        .await
        .expect("seed gallery");
    let victim = added[0].clone();

    svc.remove_image(car_id, victim.id).await.expect("remove");

    let committed = gallery.snapshot();
    assert_eq!(committed.len(), 1);
    assert!(committed.iter().all(|i| i.id != victim.id));
    // Exactly the removed image's blob was deleted.
    assert_eq!(blobs.deleted(), vec![victim.image_url]);
    // The survivor was promoted to primary.
    assert!(committed[0].is_primary);
}

#[tokio::test]
async fn removing_unknown_image_touches_no_blob() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let car_id = CarId::new();
    svc.add_images(car_id, vec![jpeg("a.jpg")])
        .await
        .expect("seed gallery");

    let err = svc
        .remove_image(car_id, CarImageId::new())
        .await
        .expect_err("unknown image");
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(blobs.deleted().is_empty());
    assert_eq!(gallery.snapshot().len(), 1);
}

#[tokio::test]
async fn explicit_primary_request_wins_over_implicit() {
    let blobs = Arc::new(RecordingBlobStore::default());
    let gallery = Arc::new(InMemoryGalleryStore::default());
    let svc = service(blobs.clone(), gallery.clone());

    let car_id = CarId::new();
    svc.add_images(car_id, vec![jpeg("existing.jpg")])
        .await
        .expect("seed gallery");

    let mut chosen = jpeg("chosen.jpg");
    chosen.make_primary = true;
    svc.add_images(car_id, vec![jpeg("first.jpg"), chosen])
        .await
        .expect("second batch");

    let committed = gallery.snapshot();
    // Writes are numbered globally: existing=0, first=1, chosen=2.
    let primaries: Vec<_> = committed.iter().filter(|i| i.is_primary).collect();
    assert_eq!(primaries.len(), 1);
    assert!(primaries[0].image_url.ends_with("/2.jpg"));
}
