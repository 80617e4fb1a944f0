use crate::api::error::AppError;
use crate::utils::auth::Claims;
use axum::{
    Extension,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio_util::io::ReaderStream;

pub(crate) fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/files/{file_id}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File download stream"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member of the group"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, file_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let file = state
        .file_service
        .download(&claims.sub, &group_id, &file_id)
        .await?;

    let content_type = file
        .record
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    tracing::info!(
        file_id = %file.record.id,
        group_id = %group_id,
        user = %claims.sub,
        "streaming download"
    );

    let stream = ReaderStream::new(file.body.into_async_read());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&file.record.filename),
        )
        .header(header::CONTENT_LENGTH, file.record.size)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_encodes_utf8() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename*=UTF-8''report%2Epdf"
        );
        assert_eq!(
            content_disposition("naïve file.txt"),
            "attachment; filename*=UTF-8''na%C3%AFve%20file%2Etxt"
        );
    }
}
