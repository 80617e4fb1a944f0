use crate::AppState;
use crate::api::error::AppError;
use crate::entities::activities::{self, ActivityKind};
use crate::services::access::{self, ANY_MEMBER};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Restrict the feed to one group the caller belongs to.
    pub group_id: Option<String>,
    /// Number of entries, clamped to 1..=100.
    pub limit: Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub id: String,
    pub user_id: String,
    pub group_id: Option<String>,
    pub file_id: Option<String>,
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl From<activities::Model> for ActivityResponse {
    fn from(a: activities::Model) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            group_id: a.group_id,
            file_id: a.file_id,
            kind: a.kind,
            description: a.description,
            timestamp: a.timestamp,
            metadata: a.metadata,
        }
    }
}

#[utoipa::path(
    get,
    path = "/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity, newest first", body = [ActivityResponse]),
        (status = 403, description = "Not a member of the requested group")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "activity"
)]
pub async fn recent_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.default_activity_limit);

    let entries = match query.group_id {
        Some(group_id) => {
            access::authorize(&state.db, &claims.sub, &group_id, ANY_MEMBER).await?;
            state.activity.recent_for_groups(&[group_id], limit).await?
        }
        None => state.activity.recent_for_user(&claims.sub, limit).await?,
    };

    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}
