use crate::api::error::AppError;
use crate::services::file_service::NewUpload;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};

use super::types::UploadResponse;

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadInput(err_msg)
    }
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/files",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    request_body(content = Multipart, description = "Multipart form with a single `file` field"),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Empty file, invalid filename or more than one file field"),
        (status = 403, description = "Not a member of the group"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        if upload.is_some() {
            return Err(AppError::BadInput(
                "Exactly one 'file' field is allowed".to_string(),
            ));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some(NewUpload {
            filename,
            content_type,
            data: data.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadInput("Missing 'file' field".to_string()))?;

    let record = state
        .file_service
        .upload(&claims.sub, &group_id, upload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id: record.id,
            filename: record.filename,
        }),
    ))
}
