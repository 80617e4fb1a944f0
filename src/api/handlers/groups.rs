use crate::AppState;
use crate::api::error::AppError;
use crate::entities::group_memberships::Role;
use crate::entities::groups;
use crate::services::group_service::{GroupSummary, MemberInfo};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Group name must be between 1 and 120 characters"
    ))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<groups::Model> for GroupResponse {
    fn from(g: groups::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            created_by: g.created_by,
            created_at: g.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Invalid group name"),
        (status = 409, description = "Group name taken")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadInput(e.to_string()))?;

    let group = state
        .group_service
        .create(&claims.sub, &req.name, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

#[utoipa::path(
    get,
    path = "/groups",
    responses(
        (status = 200, description = "Groups the caller belongs to", body = [GroupSummary])
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn list_my_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<GroupSummary>>, AppError> {
    Ok(Json(state.group_service.my_groups(&claims.sub).await?))
}

#[utoipa::path(
    delete,
    path = "/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group deleted", body = MessageResponse),
        (status = 403, description = "Only owners may delete a group"),
        (status = 404, description = "Group not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .group_service
        .delete_group(&claims.sub, &group_id)
        .await?;
    Ok(MessageResponse::new("Group deleted"))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/members",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group members", body = [MemberInfo]),
        (status = 403, description = "Not a member")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn list_members(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<MemberInfo>>, AppError> {
    Ok(Json(
        state.group_service.members(&claims.sub, &group_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/members",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added", body = MessageResponse),
        (status = 403, description = "Admin or owner role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Concurrent membership change, retry"),
        (status = 409, description = "Already a member")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn add_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .group_service
        .add_member(&claims.sub, &group_id, &req.username, req.role)
        .await?;
    Ok(MessageResponse::new(format!(
        "{} added to group",
        req.username
    )))
}

#[utoipa::path(
    delete,
    path = "/groups/{group_id}/members/{username}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("username" = String, Path, description = "Handle of the member to remove")
    ),
    responses(
        (status = 200, description = "Member removed", body = MessageResponse),
        (status = 400, description = "Would remove the last owner"),
        (status = 403, description = "Admin or owner role required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "groups"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, username)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .group_service
        .remove_member(&claims.sub, &group_id, &username)
        .await?;
    Ok(MessageResponse::new(format!("{} removed from group", username)))
}
