use crate::config::AppConfig;
use crate::services::{activity::ActivityService, storage::StorageService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod delete;
pub mod query;
pub mod types;
pub mod upload;

pub use types::{DownloadedFile, FileStats, NewUpload};

pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    activity: ActivityService,
    config: AppConfig,
}

impl FileService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        activity: ActivityService,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            storage,
            activity,
            config,
        }
    }
}
