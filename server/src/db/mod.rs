// grocer_server/src/db/mod.rs
pub mod pg_store;
pub mod rows;
pub mod seed;

pub use pg_store::PgStore;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let url = config
    .database_url
    .as_deref()
    .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;

  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .connect(url)
    .await?;
  info!(max_connections = config.db_max_connections, "Successfully connected to the database.");

  if config.run_migrations {
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied.");
  }
  Ok(pool)
}
