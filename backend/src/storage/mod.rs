//! Blob storage for uploaded gallery images.
//!
//! Physical files live outside the transactional record store; rows only
//! carry locators. The store is namespaced per car, so cross-car
//! interference is impossible by construction.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Directory under the upload root (and URL prefix) for car galleries.
const CAR_UPLOAD_DIR: &str = "uploads/cars";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` under the given namespace with a collision-resistant
    /// generated name, returning the web-facing locator.
    async fn write(
        &self,
        namespace: &str,
        extension: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String>;

    /// Deletes the blob behind a locator. Deleting a locator whose file is
    /// already gone succeeds.
    async fn delete(&self, locator: &str) -> anyhow::Result<()>;
}

/// Filesystem-backed blob store rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a web-facing locator back to a path under the root, rejecting
    /// anything that would escape it.
    fn resolve(&self, locator: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(locator.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            anyhow::bail!("invalid blob locator: {locator}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(
        &self,
        namespace: &str,
        extension: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
        let dir = self.root.join(CAR_UPLOAD_DIR).join(namespace);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("/{CAR_UPLOAD_DIR}/{namespace}/{file_name}"))
    }

    async fn delete(&self, locator: &str) -> anyhow::Result<()> {
        let path = self.resolve(locator)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
