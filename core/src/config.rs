// grocer/src/config.rs

pub const DEFAULT_MAX_OTP_ATTEMPTS: u32 = 5;

/// Knobs the lifecycle operations read at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
  /// Failed delivery codes tolerated before an order locks.
  pub max_otp_attempts: u32,
  /// Lets a shopkeeper replace the rider of an already assigned order.
  pub allow_reassignment: bool,
}

impl Default for LifecycleConfig {
  fn default() -> Self {
    Self {
      max_otp_attempts: DEFAULT_MAX_OTP_ATTEMPTS,
      allow_reassignment: false,
    }
  }
}
