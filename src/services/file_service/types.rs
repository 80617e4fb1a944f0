use crate::entities::group_files;
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use utoipa::ToSchema;

/// A file as received from a client, before validation.
pub struct NewUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub struct DownloadedFile {
    pub record: group_files::Model,
    pub body: ByteStream,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileStats {
    pub group_count: u64,
    pub uploaded_files: u64,
    pub uploaded_bytes: i64,
}
