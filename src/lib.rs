pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::handlers::{activity, auth, files, groups, health};
use crate::config::AppConfig;
use crate::services::activity::ActivityService;
use crate::services::file_service::FileService;
use crate::services::group_service::GroupService;
use crate::services::storage::StorageService;
use crate::services::user_service::UserService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::me,
        groups::create_group,
        groups::list_my_groups,
        groups::delete_group,
        groups::list_members,
        groups::add_member,
        groups::remove_member,
        files::upload_file,
        files::list_files,
        files::download_file,
        files::delete_file,
        files::file_stats,
        activity::recent_activity,
        health::health_check,
    ),
    components(
        schemas(
            services::user_service::NewUser,
            services::user_service::UserProfile,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterResponse,
            groups::CreateGroupRequest,
            groups::GroupResponse,
            groups::AddMemberRequest,
            groups::MessageResponse,
            services::group_service::GroupSummary,
            services::group_service::MemberInfo,
            entities::group_memberships::Role,
            files::UploadResponse,
            files::FileResponse,
            services::file_service::FileStats,
            activity::ActivityResponse,
            entities::activities::ActivityKind,
            health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "groups", description = "Groups and membership"),
        (name = "files", description = "Group file sharing"),
        (name = "activity", description = "Activity feed"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub file_service: Arc<FileService>,
    pub group_service: Arc<GroupService>,
    pub user_service: Arc<UserService>,
    pub activity: ActivityService,
    pub config: AppConfig,
}

impl AppState {
    /// Wires every service over one connection and one blob store.
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        let activity = ActivityService::new(db.clone());

        Self {
            file_service: Arc::new(FileService::new(
                db.clone(),
                storage.clone(),
                activity.clone(),
                config.clone(),
            )),
            group_service: Arc::new(GroupService::new(db.clone(), activity.clone())),
            user_service: Arc::new(UserService::new(db.clone())),
            db,
            storage,
            activity,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/groups",
            get(groups::list_my_groups).post(groups::create_group),
        )
        .route("/groups/:group_id", delete(groups::delete_group))
        .route(
            "/groups/:group_id/members",
            get(groups::list_members).post(groups::add_member),
        )
        .route(
            "/groups/:group_id/members/:username",
            delete(groups::remove_member),
        )
        .route(
            "/groups/:group_id/files",
            get(files::list_files).post(files::upload_file),
        )
        .route(
            "/groups/:group_id/files/:file_id",
            get(files::download_file).delete(files::delete_file),
        )
        .route("/files/stats", get(files::file_stats))
        .route("/activity", get(activity::recent_activity))
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        // Multipart framing overhead on top of the file itself.
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size + 10 * 1024 * 1024,
        ))
        .with_state(state)
}
