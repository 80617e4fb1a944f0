use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Denied,

    #[error("Insufficient permission for this operation")]
    InsufficientPermission,

    #[error("Not a member of this group")]
    NotAMember,

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Name already taken: {0}")]
    NameTaken(String),

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("A group must keep at least one owner")]
    LastOwner,

    #[error("A concurrent change touched the same rows, retry the request")]
    ConcurrentUpdate,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Bad Request: {0}")]
    BadInput(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind, returned as `code` in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Denied => "DENIED",
            AppError::InsufficientPermission => "INSUFFICIENT_PERMISSION",
            AppError::NotAMember => "NOT_A_MEMBER",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::NameTaken(_) => "NAME_TAKEN",
            AppError::AlreadyMember => "ALREADY_MEMBER",
            AppError::LastOwner => "LAST_OWNER",
            AppError::ConcurrentUpdate => "CONCURRENT_UPDATE",
            AppError::EmptyFile => "EMPTY_FILE",
            AppError::BadInput(_) => "BAD_INPUT",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::StorageFailure(_) | AppError::Database(_) => "STORAGE_FAILURE",
            AppError::Internal(_) | AppError::Anyhow(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Denied => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermission | AppError::NotAMember => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NameTaken(_) | AppError::AlreadyMember | AppError::ConcurrentUpdate => {
                StatusCode::CONFLICT
            }
            AppError::LastOwner | AppError::EmptyFile | AppError::BadInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageFailure(_)
            | AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps lock contention reported by the database to `ConcurrentUpdate`.
    /// Every other error passes through.
    pub fn or_contention(self) -> Self {
        match self {
            AppError::Database(ref e) if is_contention(e) => AppError::ConcurrentUpdate,
            other => other,
        }
    }
}

// SQLite BUSY/LOCKED (any extended code), Postgres serialization failure
// and deadlock.
fn is_contention(err: &DbErr) -> bool {
    let sqlx_err = match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => e,
        _ => return false,
    };

    let Some(code) = sqlx_err.as_database_error().and_then(|d| d.code()) else {
        return false;
    };

    match code.as_ref() {
        "40001" | "40P01" => true,
        other if other.len() <= 4 => other
            .parse::<i32>()
            .is_ok_and(|c| matches!(c & 0xff, 5 | 6)),
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.kind();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal Server Error".to_string()
            }
            AppError::StorageFailure(msg) => {
                tracing::error!("Storage failure: {}", msg);
                "Storage failure".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                "Internal Server Error".to_string()
            }
            AppError::NotFound(msg)
            | AppError::BadInput(msg)
            | AppError::PayloadTooLarge(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
