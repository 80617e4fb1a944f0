//! Access-control gate in front of every group-scoped operation.
//!
//! Callers pass the connection they intend to mutate through, so that the
//! membership check and the write happen inside one transaction.

use crate::api::error::AppError;
use crate::entities::group_memberships::Role;
use crate::entities::{group_files, group_memberships, prelude::*};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// Any membership at all.
pub const ANY_MEMBER: &[Role] = &[Role::Member];
/// Admins and owners.
pub const MANAGERS: &[Role] = &[Role::Admin, Role::Owner];
pub const OWNER_ONLY: &[Role] = &[Role::Owner];

/// Resolves the actor's membership in `group_id` and checks its role.
///
/// Fails with `NotFound` when the group does not exist, `NotAMember` when the
/// actor has no membership, and `InsufficientPermission` when the role does
/// not pass `required`.
pub async fn authorize<C: ConnectionTrait>(
    conn: &C,
    actor: &str,
    group_id: &str,
    required: &[Role],
) -> Result<group_memberships::Model, AppError> {
    let membership = find_membership(conn, actor, group_id).await?;

    let Some(membership) = membership else {
        let group_exists = Groups::find_by_id(group_id).one(conn).await?.is_some();
        return Err(if group_exists {
            AppError::NotAMember
        } else {
            AppError::NotFound("Group not found".to_string())
        });
    };

    if !membership.role.satisfies(required) {
        tracing::debug!(
            actor = %actor,
            group_id = %group_id,
            role = %membership.role,
            "permission check failed"
        );
        return Err(AppError::InsufficientPermission);
    }

    Ok(membership)
}

pub async fn find_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    group_id: &str,
) -> Result<Option<group_memberships::Model>, AppError> {
    Ok(GroupMemberships::find()
        .filter(group_memberships::Column::UserId.eq(user_id))
        .filter(group_memberships::Column::GroupId.eq(group_id))
        .one(conn)
        .await?)
}

/// The uploader may always delete their own file; otherwise admin or owner.
pub fn can_delete_file(membership: &group_memberships::Model, file: &group_files::Model) -> bool {
    file.uploader_id == membership.user_id || membership.role.is_manager()
}
