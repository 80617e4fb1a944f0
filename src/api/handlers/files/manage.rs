use crate::api::error::AppError;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::json;

#[utoipa::path(
    delete,
    path = "/groups/{group_id}/files/{file_id}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 403, description = "Only the uploader or a group admin may delete"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, file_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .file_service
        .delete(&claims.sub, &group_id, &file_id)
        .await?;

    Ok(Json(json!({ "message": "File deleted", "file_id": file_id })))
}
