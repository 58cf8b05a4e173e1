// grocer_server/src/state.rs
use crate::config::AppConfig;
use grocer::LifecycleManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub lifecycle: LifecycleManager,
  pub config: Arc<AppConfig>,
}
