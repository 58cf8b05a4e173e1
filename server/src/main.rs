// grocer_server/src/main.rs

mod config;
mod db;
mod errors;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat, StoreBackend};
use crate::errors::Result as AppResult;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use grocer::{AssignmentPolicy, LifecycleManager, MaxActiveOrders, MemoryStore, Unbounded};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn assignment_policy(config: &AppConfig) -> Arc<dyn AssignmentPolicy> {
  match config.max_active_orders_per_rider {
    Some(limit) => Arc::new(MaxActiveOrders(limit)),
    None => Arc::new(Unbounded),
  }
}

async fn build_lifecycle(config: &AppConfig) -> AppResult<LifecycleManager> {
  let builder = match config.store_backend {
    StoreBackend::Postgres => {
      let pool = db::connect(config).await?;
      if config.seed_db {
        db::seed::seed_postgres(&pool).await?;
      }
      let store = Arc::new(db::PgStore::new(pool));
      LifecycleManager::builder(store.clone(), store)
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; all data is lost on shutdown.");
      let store = Arc::new(MemoryStore::new());
      if config.seed_db {
        db::seed::seed_memory(&store);
      }
      LifecycleManager::builder(store.clone(), store)
    }
  };
  Ok(
    builder
      .config(config.lifecycle())
      .policy(assignment_policy(config))
      .build(),
  )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing(LogFormat::from_env());

  tracing::info!("Starting grocer order lifecycle server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let lifecycle = match build_lifecycle(&app_config).await {
    Ok(lifecycle) => lifecycle,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise the order store.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };
  tracing::info!(
    max_otp_attempts = lifecycle.config().max_otp_attempts,
    allow_reassignment = lifecycle.config().allow_reassignment,
    "Lifecycle workflows registered."
  );

  let app_state = AppState {
    lifecycle,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
