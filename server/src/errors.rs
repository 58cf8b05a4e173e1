// grocer_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use grocer::{ErrorKind, LifecycleError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Stable machine-readable code sent as the `error` field.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Lifecycle(e) => e.kind().code(),
      AppError::Validation(_) => ErrorKind::ValidationError.code(),
      AppError::Auth(_) => "unauthorized",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        ErrorKind::Internal.code()
      }
    }
  }
}

fn lifecycle_status(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::InvalidTransition | ErrorKind::DuplicateActiveReturn | ErrorKind::InsufficientStock => {
      StatusCode::CONFLICT
    }
    ErrorKind::InvalidOtp
    | ErrorKind::ReturnWindowExpired
    | ErrorKind::ItemNotReturnable
    | ErrorKind::OrderNotDelivered
    | ErrorKind::RiderUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::OtpAttemptsExceeded => StatusCode::LOCKED,
    ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Lifecycle(e) => lifecycle_status(e.kind()),
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    // Internal details stay in the logs.
    let message = if status.is_server_error() {
      "An internal error occurred".to_string()
    } else {
      self.to_string()
    };
    HttpResponse::build(status).json(json!({ "error": self.code(), "message": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn lifecycle_errors_map_to_http_statuses() {
    let cases = [
      (LifecycleError::not_found("order", Uuid::nil()), 404),
      (LifecycleError::InvalidOtp, 422),
      (LifecycleError::OtpAttemptsExceeded { order_id: Uuid::nil() }, 423),
      (LifecycleError::InsufficientStock { product_id: Uuid::nil() }, 409),
      (LifecycleError::validation("bad"), 400),
      (LifecycleError::store(anyhow::anyhow!("boom")), 500),
    ];
    for (err, status) in cases {
      assert_eq!(AppError::from(err).status_code().as_u16(), status);
    }
  }

  #[test]
  fn auth_failures_are_unauthorized() {
    let err = AppError::Auth("missing header".into());
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.code(), "unauthorized");
  }
}
