use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn validate_handle(handle: &str) -> Result<(), validator::ValidationError> {
    if handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_handle"))
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NewUser {
    #[validate(
        length(min = 3, max = 80, message = "Username must be between 3 and 80 characters"),
        custom(function = "validate_handle", message = "Username may only contain letters, digits, '.', '-' and '_'")
    )]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Public view of a user; never carries the credential hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub last_login: Option<chrono::DateTime<Utc>>,
}

impl From<users::Model> for UserProfile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register(&self, req: NewUser) -> Result<users::Model, AppError> {
        req.validate()
            .map_err(|e| AppError::BadInput(e.to_string()))?;

        if self.find_by_handle(&req.username).await?.is_some() {
            return Err(AppError::NameTaken(req.username));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .to_string();

        let user = users::ActiveModel {
            id: Set(Uuid::now_v7().to_string()),
            username: Set(req.username.clone()),
            email: Set(req.email),
            password_hash: Set(password_hash),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            last_login: Set(None),
        };

        let user = user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::NameTaken(req.username),
            _ => AppError::Database(e),
        })?;

        tracing::info!("👤 Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Checks credentials. Unknown users, wrong passwords and deactivated
    /// accounts all fail the same way.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let user = self
            .find_by_handle(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Denied)?;

        let parsed_hash =
            PasswordHash::new(&user.password_hash).map_err(|e| AppError::Internal(e.to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Denied)?;

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now()));
        let user = active.update(&self.db).await?;

        Ok(user)
    }

    pub async fn find_by_handle(&self, username: &str) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    pub async fn find_active(&self, user_id: &str) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find_by_id(user_id)
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        self.find_active(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(AppError::Denied)
    }

    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<(), AppError> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.update(&self.db).await?;
        Ok(())
    }
}
