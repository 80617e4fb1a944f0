use crate::api::error::AppError;
use crate::entities::activities::ActivityKind;
use crate::entities::{group_files, prelude::*};
use crate::services::access::{self, ANY_MEMBER};
use crate::services::activity::NewActivity;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

use super::FileService;

impl FileService {
    /// Soft-deletes a file. The blob is kept so the file can be recovered.
    pub async fn delete(&self, actor: &str, group_id: &str, file_id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let membership = access::authorize(&txn, actor, group_id, ANY_MEMBER).await?;

        let file = GroupFiles::find_by_id(file_id)
            .filter(group_files::Column::GroupId.eq(group_id))
            .filter(group_files::Column::IsDeleted.eq(false))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !access::can_delete_file(&membership, &file) {
            return Err(AppError::InsufficientPermission);
        }

        let mut active: group_files::ActiveModel = file.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(chrono::Utc::now()));
        let file = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!("Soft deleted file {} in group {}", file.id, group_id);

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::Delete,
                    actor,
                    format!("Deleted '{}'", file.filename),
                )
                .group(group_id)
                .file(&file.id),
            )
            .await;

        Ok(())
    }
}
