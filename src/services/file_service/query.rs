use crate::api::error::AppError;
use crate::entities::activities::ActivityKind;
use crate::entities::{group_files, group_memberships, prelude::*};
use crate::services::access::{self, ANY_MEMBER};
use crate::services::activity::NewActivity;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use super::{DownloadedFile, FileService, types::FileStats};

impl FileService {
    /// Live files of a group, newest first.
    pub async fn list(
        &self,
        actor: &str,
        group_id: &str,
    ) -> Result<Vec<group_files::Model>, AppError> {
        access::authorize(&self.db, actor, group_id, ANY_MEMBER).await?;

        let files = GroupFiles::find()
            .filter(group_files::Column::GroupId.eq(group_id))
            .filter(group_files::Column::IsDeleted.eq(false))
            .order_by_desc(group_files::Column::UploadedAt)
            .order_by_desc(group_files::Column::Id)
            .all(&self.db)
            .await?;

        Ok(files)
    }

    /// Opens a live file of the group for streaming.
    ///
    /// A missing id, a file of another group and a soft-deleted file all
    /// produce the same `NotFound`.
    ///
    /// The `download` activity entry is written once the blob stream is
    /// open, before any bytes reach the client; an interrupted transfer is
    /// still recorded.
    pub async fn download(
        &self,
        actor: &str,
        group_id: &str,
        file_id: &str,
    ) -> Result<DownloadedFile, AppError> {
        access::authorize(&self.db, actor, group_id, ANY_MEMBER).await?;

        let record = GroupFiles::find_by_id(file_id)
            .filter(group_files::Column::GroupId.eq(group_id))
            .filter(group_files::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let body = self
            .storage
            .get_object_stream(&record.stored_key)
            .await
            .map_err(|e| {
                AppError::StorageFailure(format!("blob read for {}: {}", record.stored_key, e))
            })?;

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::Download,
                    actor,
                    format!("Downloaded '{}'", record.filename),
                )
                .group(group_id)
                .file(&record.id),
            )
            .await;

        Ok(DownloadedFile { record, body })
    }

    /// Dashboard counters for one user.
    pub async fn stats(&self, actor: &str) -> Result<FileStats, AppError> {
        let group_count = GroupMemberships::find()
            .filter(group_memberships::Column::UserId.eq(actor))
            .count(&self.db)
            .await?;

        let sizes: Vec<i64> = GroupFiles::find()
            .select_only()
            .column(group_files::Column::Size)
            .filter(group_files::Column::UploaderId.eq(actor))
            .filter(group_files::Column::IsDeleted.eq(false))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(FileStats {
            group_count,
            uploaded_files: sizes.len() as u64,
            uploaded_bytes: sizes.iter().sum(),
        })
    }
}
