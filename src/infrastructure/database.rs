use crate::entities::{activities, group_files, group_memberships, groups, users};
use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

/// Creates every table from its entity definition. Safe to run repeatedly.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Running SeaORM schema sync...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Referenced tables first so foreign keys resolve on PostgreSQL
    let stmts = vec![
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(groups::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(group_memberships::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(group_files::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(activities::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    let indexes = [
        schema.create_index_from_entity(group_memberships::Entity),
        schema.create_index_from_entity(group_files::Entity),
        schema.create_index_from_entity(activities::Entity),
    ];
    for mut index in indexes.into_iter().flatten() {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    // One membership per (user, group)
    db.execute(sea_orm::Statement::from_string(
        builder,
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_group_memberships_user_group ON group_memberships(user_id, group_id);".to_string(),
    ))
    .await?;

    db.execute(sea_orm::Statement::from_string(
        builder,
        "CREATE INDEX IF NOT EXISTS idx_group_files_group_live ON group_files(group_id, is_deleted, uploaded_at);".to_string(),
    ))
    .await?;

    info!("✅ Schema ready");
    Ok(())
}
