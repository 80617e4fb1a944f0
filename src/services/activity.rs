use crate::api::error::AppError;
use crate::entities::activities::{self, ActivityKind};
use crate::entities::{group_memberships, prelude::*};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

pub const MAX_ACTIVITY_LIMIT: u64 = 100;

/// An activity about to be appended.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub user_id: String,
    pub group_id: Option<String>,
    pub file_id: Option<String>,
    pub description: String,
    pub metadata: Option<Value>,
}

impl NewActivity {
    pub fn new(kind: ActivityKind, user_id: &str, description: impl Into<String>) -> Self {
        Self {
            kind,
            user_id: user_id.to_string(),
            group_id: None,
            file_id: None,
            description: description.into(),
            metadata: None,
        }
    }

    pub fn group(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }

    pub fn file(mut self, file_id: &str) -> Self {
        self.file_id = Some(file_id.to_string());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Append-only activity history.
#[derive(Clone)]
pub struct ActivityService {
    db: DatabaseConnection,
}

impl ActivityService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one entry. Must only be called once the operation it describes
    /// has committed. A failed insert is logged and swallowed.
    pub async fn record(&self, entry: NewActivity) {
        info!(
            target: "activity",
            kind = %entry.kind,
            user_id = %entry.user_id,
            group_id = ?entry.group_id,
            file_id = ?entry.file_id,
            "{}",
            entry.description
        );

        let model = activities::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            user_id: Set(entry.user_id),
            group_id: Set(entry.group_id),
            file_id: Set(entry.file_id),
            kind: Set(entry.kind),
            description: Set(entry.description),
            timestamp: Set(chrono::Utc::now()),
            metadata: Set(entry.metadata),
        };

        if let Err(e) = model.insert(&self.db).await {
            error!("Failed to persist activity entry: {}", e);
        }
    }

    /// Newest-first entries touching any of `group_ids`.
    pub async fn recent_for_groups(
        &self,
        group_ids: &[String],
        limit: u64,
    ) -> Result<Vec<activities::Model>, AppError> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entries = Activities::find()
            .filter(activities::Column::GroupId.is_in(group_ids.iter().cloned()))
            .order_by_desc(activities::Column::Timestamp)
            .order_by_desc(activities::Column::Id)
            .limit(limit.clamp(1, MAX_ACTIVITY_LIMIT))
            .all(&self.db)
            .await?;

        Ok(entries)
    }

    /// Recent activity across every group the user currently belongs to,
    /// plus every entry the user authored, including those of groups that
    /// were since deleted or left.
    pub async fn recent_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<activities::Model>, AppError> {
        let group_ids: Vec<String> = GroupMemberships::find()
            .select_only()
            .column(group_memberships::Column::GroupId)
            .filter(group_memberships::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut visible = Condition::any().add(activities::Column::UserId.eq(user_id));
        if !group_ids.is_empty() {
            visible = visible.add(activities::Column::GroupId.is_in(group_ids));
        }

        let entries = Activities::find()
            .filter(visible)
            .order_by_desc(activities::Column::Timestamp)
            .order_by_desc(activities::Column::Id)
            .limit(limit.clamp(1, MAX_ACTIVITY_LIMIT))
            .all(&self.db)
            .await?;

        Ok(entries)
    }
}
