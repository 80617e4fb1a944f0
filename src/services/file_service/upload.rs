use crate::api::error::AppError;
use crate::entities::activities::ActivityKind;
use crate::entities::group_files;
use crate::services::access::{self, ANY_MEMBER};
use crate::services::activity::NewActivity;
use crate::utils::validation::{
    detect_mime_type, key_safe_name, sanitize_filename, validate_file_size,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde_json::json;
use uuid::Uuid;

use super::{FileService, types::NewUpload};

/// Object key for a new blob. Never derived from the user-visible name alone,
/// so two uploads of `report.pdf` cannot overwrite each other.
pub fn build_stored_key(group_id: &str, actor: &str, filename: &str, at: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "groups/{}/{}_{}_{}_{}",
        group_id,
        at.timestamp_millis(),
        actor,
        &nonce[..12],
        key_safe_name(filename)
    )
}

impl FileService {
    /// Stores a blob and its metadata record.
    ///
    /// The blob is written before the record. If the record cannot be
    /// written the blob stays behind under its key and the call fails with
    /// `StorageFailure`; nothing is retried.
    pub async fn upload(
        &self,
        actor: &str,
        group_id: &str,
        upload: NewUpload,
    ) -> Result<group_files::Model, AppError> {
        access::authorize(&self.db, actor, group_id, ANY_MEMBER).await?;

        if upload.data.is_empty() {
            return Err(AppError::EmptyFile);
        }
        validate_file_size(upload.data.len(), self.config.max_file_size)?;
        let filename = sanitize_filename(&upload.filename)?;
        let mime_type = detect_mime_type(upload.content_type.as_deref(), &upload.data);

        let now = Utc::now();
        let stored_key = build_stored_key(group_id, actor, &filename, now);
        let size = upload.data.len() as i64;

        tracing::info!(
            "⬆️ Uploading '{}' ({} bytes) to group {} as {}",
            filename,
            size,
            group_id,
            stored_key
        );

        self.storage
            .upload_file(&stored_key, upload.data)
            .await
            .map_err(|e| AppError::StorageFailure(format!("blob write for {}: {}", stored_key, e)))?;

        let record = group_files::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            stored_key: Set(stored_key.clone()),
            original_filename: Set(upload.filename),
            filename: Set(filename),
            size: Set(size),
            mime_type: Set(Some(mime_type)),
            group_id: Set(group_id.to_string()),
            uploader_id: Set(actor.to_string()),
            uploaded_at: Set(now),
            is_deleted: Set(false),
            deleted_at: Set(None),
        };

        let record = match self.persist_record(actor, group_id, record).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    stored_key = %stored_key,
                    "Upload metadata not written, blob is orphaned: {}",
                    e
                );
                return Err(match e {
                    AppError::Database(db_err) => AppError::StorageFailure(format!(
                        "metadata write for {}: {}",
                        stored_key, db_err
                    )),
                    other => other,
                });
            }
        };

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::Upload,
                    actor,
                    format!("Uploaded '{}'", record.filename),
                )
                .group(group_id)
                .file(&record.id)
                .metadata(json!({
                    "filename": record.filename,
                    "size": record.size,
                    "mime_type": record.mime_type,
                })),
            )
            .await;

        Ok(record)
    }

    // Membership is checked again here: it may have been revoked while the
    // blob was in flight.
    async fn persist_record(
        &self,
        actor: &str,
        group_id: &str,
        record: group_files::ActiveModel,
    ) -> Result<group_files::Model, AppError> {
        let txn = self.db.begin().await?;
        access::authorize(&txn, actor, group_id, ANY_MEMBER).await?;
        let record = record.insert(&txn).await?;
        txn.commit().await?;
        Ok(record)
    }
}
