use crate::api::error::AppError;
use crate::services::file_service::FileStats;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use super::types::FileResponse;

#[utoipa::path(
    get,
    path = "/groups/{group_id}/files",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Live files of the group, newest first", body = [FileResponse]),
        (status = 403, description = "Not a member of the group"),
        (status = 404, description = "Group not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let files = state.file_service.list(&claims.sub, &group_id).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/files/stats",
    responses(
        (status = 200, description = "Upload counters for the caller", body = FileStats)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn file_stats(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FileStats>, AppError> {
    Ok(Json(state.file_service.stats(&claims.sub).await?))
}
