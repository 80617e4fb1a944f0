use crate::api::error::AppError;
use crate::entities::activities::ActivityKind;
use crate::entities::group_memberships::Role;
use crate::entities::{group_files, group_memberships, groups, prelude::*, users};
use crate::services::access::{self, ANY_MEMBER, MANAGERS, OWNER_ONLY};
use crate::services::activity::{ActivityService, NewActivity};
use crate::utils::validation::validate_group_name;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

/// A group as seen by one of its members.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: chrono::DateTime<Utc>,
    pub role: Role,
    pub joined_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberInfo {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub joined_at: chrono::DateTime<Utc>,
}

pub struct GroupService {
    db: DatabaseConnection,
    activity: ActivityService,
}

impl GroupService {
    pub fn new(db: DatabaseConnection, activity: ActivityService) -> Self {
        Self { db, activity }
    }

    pub async fn create(
        &self,
        actor: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<groups::Model, AppError> {
        let name = validate_group_name(name)?;
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let txn = self.db.begin().await?;

        let taken = Groups::find()
            .filter(groups::Column::Name.eq(&name))
            .one(&txn)
            .await?
            .is_some();
        if taken {
            return Err(AppError::NameTaken(name));
        }

        let now = Utc::now();
        let group = groups::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            name: Set(name.clone()),
            description: Set(description),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::NameTaken(name.clone()),
            _ => AppError::Database(e),
        })?;

        group_memberships::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            user_id: Set(actor.to_string()),
            group_id: Set(group.id.clone()),
            role: Set(Role::Owner),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!("👥 Group '{}' ({}) created by {}", group.name, group.id, actor);
        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::GroupCreated,
                    actor,
                    format!("Created group '{}'", group.name),
                )
                .group(&group.id),
            )
            .await;

        Ok(group)
    }

    /// Groups the actor belongs to, with the actor's role, ordered by name.
    pub async fn my_groups(&self, actor: &str) -> Result<Vec<GroupSummary>, AppError> {
        let rows = GroupMemberships::find()
            .filter(group_memberships::Column::UserId.eq(actor))
            .find_also_related(Groups)
            .order_by_asc(groups::Column::Name)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, group)| {
                group.map(|g| GroupSummary {
                    id: g.id,
                    name: g.name,
                    description: g.description,
                    created_by: g.created_by,
                    created_at: g.created_at,
                    role: membership.role,
                    joined_at: membership.joined_at,
                })
            })
            .collect())
    }

    /// Members of a group in join order. Requires membership.
    pub async fn members(&self, actor: &str, group_id: &str) -> Result<Vec<MemberInfo>, AppError> {
        access::authorize(&self.db, actor, group_id, ANY_MEMBER).await?;

        let rows = GroupMemberships::find()
            .filter(group_memberships::Column::GroupId.eq(group_id))
            .find_also_related(Users)
            .order_by_asc(group_memberships::Column::JoinedAt)
            .order_by_asc(group_memberships::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| {
                user.map(|u| MemberInfo {
                    user_id: u.id,
                    username: u.username,
                    role: membership.role,
                    joined_at: membership.joined_at,
                })
            })
            .collect())
    }

    pub async fn add_member(
        &self,
        actor: &str,
        group_id: &str,
        target_handle: &str,
        role: Role,
    ) -> Result<group_memberships::Model, AppError> {
        let txn = self.db.begin().await?;

        let actor_membership = access::authorize(&txn, actor, group_id, MANAGERS).await?;
        if role == Role::Owner && actor_membership.role != Role::Owner {
            return Err(AppError::InsufficientPermission);
        }

        let target = find_user_by_handle(&txn, target_handle).await?;

        if access::find_membership(&txn, &target.id, group_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyMember);
        }

        let membership = group_memberships::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            user_id: Set(target.id.clone()),
            group_id: Set(group_id.to_string()),
            role: Set(role),
            joined_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyMember,
            _ => AppError::Database(e),
        })?;

        txn.commit().await?;

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::UserJoined,
                    actor,
                    format!("Added {} to the group as {}", target.username, role),
                )
                .group(group_id)
                .metadata(json!({
                    "target_user_id": target.id,
                    "target_username": target.username,
                    "role": role,
                })),
            )
            .await;

        Ok(membership)
    }

    /// Removes a member. The owner count is re-read under the same
    /// transaction that deletes, so a group can never end up with no owner.
    ///
    /// When two removals race, the database serializes them. The loser sees
    /// `LastOwner` or `NotAMember` if it ran second, or `ConcurrentUpdate`
    /// if its transaction was refused; the latter is safe to retry.
    pub async fn remove_member(
        &self,
        actor: &str,
        group_id: &str,
        target_handle: &str,
    ) -> Result<(), AppError> {
        let (target, removed_role) = self
            .remove_member_txn(actor, group_id, target_handle)
            .await
            .map_err(AppError::or_contention)?;

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::UserRemoved,
                    actor,
                    format!("Removed {} from the group", target.username),
                )
                .group(group_id)
                .metadata(json!({
                    "target_user_id": target.id,
                    "target_username": target.username,
                    "role": removed_role,
                })),
            )
            .await;

        Ok(())
    }

    async fn remove_member_txn(
        &self,
        actor: &str,
        group_id: &str,
        target_handle: &str,
    ) -> Result<(users::Model, Role), AppError> {
        let txn = self.db.begin().await?;

        let actor_membership = access::authorize(&txn, actor, group_id, MANAGERS).await?;
        let target = find_user_by_handle(&txn, target_handle).await?;

        let target_membership = access::find_membership(&txn, &target.id, group_id)
            .await?
            .ok_or(AppError::NotAMember)?;

        if target_membership.role == Role::Owner {
            if actor_membership.role != Role::Owner {
                return Err(AppError::InsufficientPermission);
            }

            let mut owners = GroupMemberships::find()
                .filter(group_memberships::Column::GroupId.eq(group_id))
                .filter(group_memberships::Column::Role.eq(Role::Owner));
            if txn.get_database_backend() == DatabaseBackend::Postgres {
                owners = owners.lock(LockType::Update);
            }
            let owner_count = owners.all(&txn).await?.len();

            if owner_count <= 1 {
                tracing::warn!(
                    "Refusing to remove last owner {} of group {}",
                    target.id,
                    group_id
                );
                return Err(AppError::LastOwner);
            }
        }

        GroupMemberships::delete_by_id(target_membership.id.clone())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok((target, target_membership.role))
    }

    /// Owner-only. Soft-deletes every live file, drops all memberships and
    /// removes the group row, in one transaction. Blobs are left in place.
    pub async fn delete_group(&self, actor: &str, group_id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        access::authorize(&txn, actor, group_id, OWNER_ONLY).await?;

        let group = Groups::find_by_id(group_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        let now = Utc::now();
        let files = GroupFiles::update_many()
            .col_expr(group_files::Column::IsDeleted, Expr::value(true))
            .col_expr(group_files::Column::DeletedAt, Expr::value(now))
            .filter(group_files::Column::GroupId.eq(group_id))
            .filter(group_files::Column::IsDeleted.eq(false))
            .exec(&txn)
            .await?;

        let memberships = GroupMemberships::delete_many()
            .filter(group_memberships::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;

        Groups::delete_by_id(group_id).exec(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            "🗑️ Group '{}' ({}) deleted by {}: {} files soft-deleted, {} memberships removed",
            group.name,
            group.id,
            actor,
            files.rows_affected,
            memberships.rows_affected
        );

        self.activity
            .record(
                NewActivity::new(
                    ActivityKind::GroupDeleted,
                    actor,
                    format!("Deleted group '{}'", group.name),
                )
                .group(group_id)
                .metadata(json!({
                    "name": group.name,
                    "files_soft_deleted": files.rows_affected,
                    "memberships_removed": memberships.rows_affected,
                })),
            )
            .await;

        Ok(())
    }

    /// Number of owners currently recorded for a group.
    pub async fn owner_count(&self, group_id: &str) -> Result<u64, AppError> {
        use sea_orm::PaginatorTrait;

        Ok(GroupMemberships::find()
            .filter(group_memberships::Column::GroupId.eq(group_id))
            .filter(group_memberships::Column::Role.eq(Role::Owner))
            .count(&self.db)
            .await?)
    }
}

async fn find_user_by_handle<C: ConnectionTrait>(
    conn: &C,
    handle: &str,
) -> Result<users::Model, AppError> {
    Users::find()
        .filter(users::Column::Username.eq(handle))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::UserNotFound(handle.to_string()))
}
