use crate::entities::group_files;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub group_id: String,
    pub uploader_id: String,
    pub uploaded_at: chrono::DateTime<Utc>,
}

impl From<group_files::Model> for FileResponse {
    fn from(f: group_files::Model) -> Self {
        Self {
            id: f.id,
            filename: f.filename,
            original_filename: f.original_filename,
            size: f.size,
            mime_type: f.mime_type,
            group_id: f.group_id,
            uploader_id: f.uploader_id,
            uploaded_at: f.uploaded_at,
        }
    }
}
