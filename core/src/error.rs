// grocer/src/error.rs
use crate::domain::Role;
use crate::workflow::WorkflowError;
use thiserror::Error;
use uuid::Uuid;

/// Every failure a lifecycle operation can report.
///
/// All variants except `Store` and `Workflow` are expected, caller-recoverable
/// conditions. Ownership failures are reported as `NotFound` so callers cannot
/// discover other actors' resources.
#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("{entity} cannot move from '{from}' to '{to}' as {role}")]
  InvalidTransition {
    entity: &'static str,
    from: String,
    to: String,
    role: Role,
  },

  #[error("delivery code does not match")]
  InvalidOtp,

  #[error("too many incorrect delivery codes for order {order_id}")]
  OtpAttemptsExceeded { order_id: Uuid },

  #[error("insufficient stock for product {product_id}")]
  InsufficientStock { product_id: Uuid },

  #[error("an active return request already exists for order item {order_item_id}")]
  DuplicateActiveReturn { order_item_id: Uuid },

  #[error("return window of {return_period_days} days has expired")]
  ReturnWindowExpired { return_period_days: i32 },

  #[error("order item {order_item_id} is not returnable")]
  ItemNotReturnable { order_item_id: Uuid },

  #[error("order {order_id} has not been delivered")]
  OrderNotDelivered { order_id: Uuid },

  #[error("rider {rider_id} cannot take this order")]
  RiderUnavailable { rider_id: Uuid },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("store failure: {0}")]
  Store(#[source] anyhow::Error),

  #[error("workflow failure: {0}")]
  Workflow(#[from] WorkflowError),
}

/// Stable, machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  InvalidTransition,
  InvalidOtp,
  OtpAttemptsExceeded,
  InsufficientStock,
  DuplicateActiveReturn,
  ReturnWindowExpired,
  ItemNotReturnable,
  OrderNotDelivered,
  RiderUnavailable,
  ValidationError,
  Internal,
}

impl ErrorKind {
  pub fn code(self) -> &'static str {
    match self {
      ErrorKind::NotFound => "not_found",
      ErrorKind::InvalidTransition => "invalid_transition",
      ErrorKind::InvalidOtp => "invalid_otp",
      ErrorKind::OtpAttemptsExceeded => "otp_attempts_exceeded",
      ErrorKind::InsufficientStock => "insufficient_stock",
      ErrorKind::DuplicateActiveReturn => "duplicate_active_return",
      ErrorKind::ReturnWindowExpired => "return_window_expired",
      ErrorKind::ItemNotReturnable => "item_not_returnable",
      ErrorKind::OrderNotDelivered => "order_not_delivered",
      ErrorKind::RiderUnavailable => "rider_unavailable",
      ErrorKind::ValidationError => "validation_error",
      ErrorKind::Internal => "internal",
    }
  }
}

impl LifecycleError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      LifecycleError::NotFound { .. } => ErrorKind::NotFound,
      LifecycleError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
      LifecycleError::InvalidOtp => ErrorKind::InvalidOtp,
      LifecycleError::OtpAttemptsExceeded { .. } => ErrorKind::OtpAttemptsExceeded,
      LifecycleError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
      LifecycleError::DuplicateActiveReturn { .. } => ErrorKind::DuplicateActiveReturn,
      LifecycleError::ReturnWindowExpired { .. } => ErrorKind::ReturnWindowExpired,
      LifecycleError::ItemNotReturnable { .. } => ErrorKind::ItemNotReturnable,
      LifecycleError::OrderNotDelivered { .. } => ErrorKind::OrderNotDelivered,
      LifecycleError::RiderUnavailable { .. } => ErrorKind::RiderUnavailable,
      LifecycleError::Validation(_) => ErrorKind::ValidationError,
      LifecycleError::Store(_) | LifecycleError::Workflow(_) => ErrorKind::Internal,
    }
  }

  pub fn not_found(entity: &'static str, id: Uuid) -> Self {
    LifecycleError::NotFound { entity, id }
  }

  pub fn invalid_transition(
    entity: &'static str,
    from: impl std::fmt::Display,
    to: impl std::fmt::Display,
    role: Role,
  ) -> Self {
    LifecycleError::InvalidTransition {
      entity,
      from: from.to_string(),
      to: to.to_string(),
      role,
    }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    LifecycleError::Validation(message.into())
  }

  /// Wraps an unexpected backend failure.
  pub fn store(err: impl Into<anyhow::Error>) -> Self {
    LifecycleError::Store(err.into())
  }

  pub(crate) fn internal(message: &'static str) -> Self {
    LifecycleError::Store(anyhow::anyhow!(message))
  }
}

pub type Result<T, E = LifecycleError> = std::result::Result<T, E>;
