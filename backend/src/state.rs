use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::services::password_reset::PasswordResetService;
use crate::services::uploads::UploadService;
use crate::storage::{BlobStore, FsBlobStore};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub uploads: UploadService,
    pub resets: PasswordResetService,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.upload_root.clone()));
        let uploads = UploadService::new(pool.clone(), blobs);
        let resets = PasswordResetService::new(pool.clone(), config.reset_token_ttl_minutes);

        Self {
            pool,
            config,
            uploads,
            resets,
        }
    }
}
