use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[sea_orm(string_value = "upload")]
    Upload,
    #[sea_orm(string_value = "download")]
    Download,
    #[sea_orm(string_value = "delete")]
    Delete,
    #[sea_orm(string_value = "group_created")]
    GroupCreated,
    #[sea_orm(string_value = "user_joined")]
    UserJoined,
    #[sea_orm(string_value = "user_removed")]
    UserRemoved,
    #[sea_orm(string_value = "group_deleted")]
    GroupDeleted,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Append-only history row. `group_id` and `file_id` may point at rows that
/// no longer exist.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub user_id: String,
    #[sea_orm(indexed)]
    pub group_id: Option<String>,
    pub file_id: Option<String>,
    pub kind: ActivityKind,
    pub description: String,
    #[sea_orm(indexed)]
    pub timestamp: DateTimeUtc,
    pub metadata: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
