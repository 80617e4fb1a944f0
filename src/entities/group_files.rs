use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// No foreign key on group_id: file rows outlive their group for audit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub stored_key: String,
    pub original_filename: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: Option<String>,
    #[sea_orm(indexed)]
    pub group_id: String,
    #[sea_orm(indexed)]
    pub uploader_id: String,
    pub uploaded_at: DateTimeUtc,
    #[sea_orm(default_expr = "Expr::value(false)")]
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
