use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Resolves the bearer token (header, or `?token=` for plain download links)
/// into `Claims` for the downstream handler. Tokens of deleted or
/// deactivated users are rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let token = match auth_header {
        Some(t) => Some(t),
        None => {
            let query = req.uri().query().unwrap_or_default();
            serde_urlencoded::from_str::<AuthQuery>(query)
                .ok()
                .and_then(|q| q.token)
        }
    };

    let token = token.ok_or(AppError::Denied)?;
    let claims = validate_jwt(&token, &state.config.jwt_secret).map_err(|_| AppError::Denied)?;

    if state.user_service.find_active(&claims.sub).await?.is_none() {
        return Err(AppError::Denied);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
