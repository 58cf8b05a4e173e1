// grocer_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use grocer::config::DEFAULT_MAX_OTP_ATTEMPTS;
use grocer::LifecycleConfig;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" | "mem" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}': expected postgres or memory", other))),
    }
  }
}

impl StoreBackend {
  pub fn as_str(self) -> &'static str {
    match self {
      StoreBackend::Postgres => "postgres",
      StoreBackend::Memory => "memory",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  /// Read on its own, ahead of `AppConfig`, so the subscriber exists before
  /// configuration loading logs anything.
  pub fn from_env() -> Self {
    match env::var("LOG_FORMAT").as_deref() {
      Ok("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required for the postgres backend only.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
  /// Inserts a demo shop, catalog, rider and address on startup.
  pub seed_db: bool,

  pub max_otp_attempts: u32,
  pub allow_rider_reassignment: bool,
  /// Unset means riders may carry any number of orders.
  pub max_active_orders_per_rider: Option<u32>,
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
    Err(_) => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", 8080u16)?;
    let store_backend = match env::var("STORE_BACKEND") {
      Ok(raw) => raw.parse::<StoreBackend>()?,
      Err(_) => StoreBackend::Postgres,
    };
    let database_url = env::var("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 10u32)?;
    let run_migrations = parse_var("RUN_MIGRATIONS", true)?;
    let seed_db = parse_var("SEED_DB", false)?;

    let max_otp_attempts = parse_var("MAX_OTP_ATTEMPTS", DEFAULT_MAX_OTP_ATTEMPTS)?;
    if max_otp_attempts == 0 {
      return Err(AppError::Config("MAX_OTP_ATTEMPTS must be at least 1".to_string()));
    }
    let allow_rider_reassignment = parse_var("ALLOW_RIDER_REASSIGNMENT", false)?;
    let max_active_orders_per_rider = match env::var("MAX_ACTIVE_ORDERS_PER_RIDER") {
      Ok(raw) if !raw.trim().is_empty() => Some(
        raw
          .trim()
          .parse::<u32>()
          .map_err(|e| AppError::Config(format!("Invalid MAX_ACTIVE_ORDERS_PER_RIDER: {}", e)))?,
      ),
      _ => None,
    };

    tracing::info!(?store_backend, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      db_max_connections,
      run_migrations,
      seed_db,
      max_otp_attempts,
      allow_rider_reassignment,
      max_active_orders_per_rider,
    })
  }

  pub fn lifecycle(&self) -> LifecycleConfig {
    LifecycleConfig {
      max_otp_attempts: self.max_otp_attempts,
      allow_reassignment: self.allow_rider_reassignment,
    }
  }
}
