use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All backends reachable", body = HealthResponse),
        (status = 503, description = "A backend is unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = state.db.ping().await.is_ok();
    // A missing health-check key is still a successful round trip.
    let storage_ok = state.storage.file_exists("health-check").await.is_ok();

    let label = |ok: bool| {
        let status = if ok { "connected" } else { "disconnected" };
        status.to_string()
    };
    let (code, status) = if db_ok && storage_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            database: label(db_ok),
            storage: label(storage_ok),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
