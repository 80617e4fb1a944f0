#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use groupvault::AppState;
use groupvault::config::AppConfig;
use groupvault::entities::group_memberships::Role;
use groupvault::entities::{group_memberships, prelude::*};
use groupvault::infrastructure::database;
use groupvault::services::file_service::NewUpload;
use groupvault::services::storage::StorageService;
use groupvault::services::user_service::NewUser;
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub async fn setup_test_db() -> DatabaseConnection {
    // Every pooled connection to sqlite::memory: would get its own database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// A SQLite file shared by several pooled connections, so transactions can
/// actually interleave. Returns the path for cleanup.
pub async fn setup_file_db(connections: u32) -> (DatabaseConnection, PathBuf) {
    let path = std::env::temp_dir().join(format!("groupvault-{}.db", uuid::Uuid::new_v4()));
    let mut opt = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opt.max_connections(connections).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    (db, path)
}

pub async fn teardown_file_db(db: DatabaseConnection, path: PathBuf) {
    db.close().await.unwrap();
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

pub struct MockStorageService {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn blob_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<ByteStream> {
        let data = self
            .files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such key: {}", key))?;
        Ok(ByteStream::from(data))
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(key))
    }
}

/// Blob store that rejects every write.
pub struct FailingStorage;

#[async_trait]
impl StorageService for FailingStorage {
    async fn upload_file(&self, _key: &str, _data: Vec<u8>) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("bucket unavailable"))
    }

    async fn get_object_stream(&self, _key: &str) -> anyhow::Result<ByteStream> {
        Err(anyhow::anyhow!("bucket unavailable"))
    }

    async fn file_exists(&self, _key: &str) -> anyhow::Result<bool> {
        Err(anyhow::anyhow!("bucket unavailable"))
    }
}

/// Accepts the blob, then revokes the uploader's membership before the
/// metadata write happens.
pub struct RevokingStorage {
    pub inner: MockStorageService,
    pub db: DatabaseConnection,
    pub user_id: String,
    pub group_id: String,
}

#[async_trait]
impl StorageService for RevokingStorage {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.inner.upload_file(key, data).await?;
        GroupMemberships::delete_many()
            .filter(group_memberships::Column::UserId.eq(self.user_id.as_str()))
            .filter(group_memberships::Column::GroupId.eq(self.group_id.as_str()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<ByteStream> {
        self.inner.get_object_stream(key).await
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        self.inner.file_exists(key).await
    }
}

/// Accepts the blob, then moves the file table out of the way so the
/// metadata insert fails. `restore` puts it back.
pub struct TableStashingStorage {
    pub inner: MockStorageService,
    pub db: DatabaseConnection,
}

impl TableStashingStorage {
    pub async fn restore(&self) {
        self.db
            .execute_unprepared("ALTER TABLE group_files_stash RENAME TO group_files")
            .await
            .unwrap();
    }
}

#[async_trait]
impl StorageService for TableStashingStorage {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.inner.upload_file(key, data).await?;
        self.db
            .execute_unprepared("ALTER TABLE group_files RENAME TO group_files_stash")
            .await?;
        Ok(())
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<ByteStream> {
        self.inner.get_object_stream(key).await
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        self.inner.file_exists(key).await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        max_file_size: 1024 * 1024,
        jwt_secret: "test-secret".to_string(),
        ..AppConfig::default()
    }
}

pub async fn test_state() -> (AppState, Arc<MockStorageService>) {
    let db = setup_test_db().await;
    let storage = Arc::new(MockStorageService::new());
    let state = AppState::new(db, storage.clone(), test_config());
    (state, storage)
}

/// Registers a user with a fixed password and returns its id.
pub async fn register(state: &AppState, username: &str) -> String {
    state
        .user_service
        .register(NewUser {
            username: username.to_string(),
            password: "password123".to_string(),
            email: None,
        })
        .await
        .unwrap()
        .id
}

pub async fn create_group(state: &AppState, owner: &str, name: &str) -> String {
    state
        .group_service
        .create(owner, name, None)
        .await
        .unwrap()
        .id
}

pub async fn add(state: &AppState, actor: &str, group_id: &str, handle: &str, role: Role) {
    state
        .group_service
        .add_member(actor, group_id, handle, role)
        .await
        .unwrap();
}

pub fn new_upload(filename: &str, data: &[u8]) -> NewUpload {
    NewUpload {
        filename: filename.to_string(),
        content_type: None,
        data: data.to_vec(),
    }
}
